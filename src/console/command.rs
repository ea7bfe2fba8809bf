use crate::media_session::RemoteCommand;
use crate::settings::{MAX_CROSSFADE_MS, MIN_CROSSFADE_MS};

#[derive(Debug, Clone, PartialEq)]
pub enum ConsoleCommand {
    /// Station id or 1-based list position.
    Play(String),
    TogglePause,
    Stop,
    Next,
    Previous,
    /// 0..=100
    Volume(u8),
    Crossfade(CrossfadeChange),
    /// Simulated media key, routed through the controller like an OS remote.
    MediaKey(RemoteCommand),
    List,
    Status,
    Help,
    Quit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CrossfadeChange {
    Enable(bool),
    DurationMs(u64),
}

pub const HELP: &str = "\
commands:
  play <id|n>          play a station (again to pause/resume)
  pause                toggle pause
  stop                 stop playback
  next | prev          neighbouring station
  vol <0-100>          set volume
  crossfade on|off|<ms>
  key <play|pause|stop|next|prev>
  list                 list stations
  status               current status
  help                 this text
  quit";

pub fn parse(line: &str) -> Result<ConsoleCommand, String> {
    let mut parts = line.split_whitespace();
    let Some(verb) = parts.next() else {
        return Err("empty command".to_owned());
    };
    let rest: Vec<&str> = parts.collect();
    let arg = rest.first().copied();

    let cmd = match verb.to_ascii_lowercase().as_str() {
        "play" | "p" => match arg {
            Some(token) => ConsoleCommand::Play(token.to_owned()),
            None => return Err("usage: play <id|n>".to_owned()),
        },
        "pause" | "toggle" | "space" => ConsoleCommand::TogglePause,
        "stop" | "s" => ConsoleCommand::Stop,
        "next" | "n" => ConsoleCommand::Next,
        "prev" | "previous" => ConsoleCommand::Previous,
        "vol" | "volume" | "v" => {
            let raw = arg.ok_or_else(|| "usage: vol <0-100>".to_owned())?;
            let v: u8 = raw
                .parse()
                .map_err(|_| format!("not a volume: {raw}"))?;
            if v > 100 {
                return Err(format!("volume out of range: {v}"));
            }
            ConsoleCommand::Volume(v)
        }
        "crossfade" | "xf" => {
            let raw = arg.ok_or_else(|| "usage: crossfade on|off|<ms>".to_owned())?;
            let change = match raw {
                "on" => CrossfadeChange::Enable(true),
                "off" => CrossfadeChange::Enable(false),
                ms => {
                    let ms: u64 = ms
                        .trim_end_matches("ms")
                        .parse()
                        .map_err(|_| format!("not a duration: {raw}"))?;
                    if !(MIN_CROSSFADE_MS..=MAX_CROSSFADE_MS).contains(&ms) {
                        return Err(format!(
                            "crossfade must be {MIN_CROSSFADE_MS}..={MAX_CROSSFADE_MS} ms"
                        ));
                    }
                    CrossfadeChange::DurationMs(ms)
                }
            };
            ConsoleCommand::Crossfade(change)
        }
        "key" => {
            let raw = arg.ok_or_else(|| "usage: key <play|pause|stop|next|prev>".to_owned())?;
            let key = RemoteCommand::from_action(raw)
                .ok_or_else(|| format!("unknown media key: {raw}"))?;
            ConsoleCommand::MediaKey(key)
        }
        "list" | "ls" | "l" => ConsoleCommand::List,
        "status" | "st" => ConsoleCommand::Status,
        "help" | "h" | "?" => ConsoleCommand::Help,
        "quit" | "exit" | "q" => ConsoleCommand::Quit,
        other => return Err(format!("unknown command: {other} (try `help`)")),
    };
    Ok(cmd)
}
