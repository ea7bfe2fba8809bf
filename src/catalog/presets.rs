use crate::domain::Station;

/// Seed list used when nothing usable is stored yet.
pub fn default_stations() -> Vec<Station> {
    vec![
        Station::preset(
            "preset-1",
            "NPO Radio 1",
            "https://www.mp3streams.nl/zender/npo-radio-1/stream/1-aac-64",
            "https://www.mp3streams.nl/logo/z/npo-radio-1",
        ),
        Station::preset(
            "preset-2",
            "NPO Radio 2",
            "https://www.mp3streams.nl/zender/npo-radio-2/stream/3-aac-64",
            "https://www.mp3streams.nl/logo/z/npo-radio-2",
        ),
        Station::preset(
            "preset-3",
            "NPO 3FM",
            "https://www.mp3streams.nl/zender/3fm/stream/7-aac-64",
            "https://www.mp3streams.nl/logo/z/3fm",
        ),
        Station::preset(
            "preset-4",
            "KINK",
            "https://www.mp3streams.nl/zender/kink/stream/19-aac-128",
            "https://www.mp3streams.nl/logo/z/kink",
        ),
        Station::preset(
            "preset-5",
            "NPO Radio 2 Soul & Jazz",
            "https://www.mp3streams.nl/zender/npo-radio-2-soul-jazz/stream/44-mp3-192",
            "https://www.mp3streams.nl/logo/z/npo-radio-2-soul-jazz",
        ),
        Station::preset(
            "preset-6",
            "Classic NL",
            "https://stream.classic.nl/classicnl-mindradio.mp3",
            "https://classic.nl/images/logo-classicnl-header.png",
        ),
        Station::preset(
            "preset-7",
            "Radio Subasio",
            "https://icy.unitedradio.it/Subasio.mp3",
            "https://i.imgur.com/U8zaFmv.png",
        ),
    ]
}
