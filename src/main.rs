use std::path::PathBuf;

use anyhow::Result;
use clap::{arg, value_parser, Command};
use wavemark::{app::run, config::MarkerSpeed, config::ViewerConfig, player::output_device_names};

fn cli() -> Command {
    Command::new("wavemark")
        .about("Click-to-play waveform viewer")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .subcommand(
            Command::new("view")
                .about("Show a WAV file and play it from wherever you click")
                .arg(arg!([FILE] "16-bit PCM WAV file to open").value_parser(value_parser!(PathBuf)))
                .arg(
                    arg!(--width <PX> "Canvas width in pixels")
                        .required(false)
                        .value_parser(value_parser!(usize))
                        .default_value("850"),
                )
                .arg(
                    arg!(--height <PX> "Canvas height in pixels")
                        .required(false)
                        .value_parser(value_parser!(usize))
                        .default_value("275"),
                )
                .arg(
                    arg!(--start <SECONDS> "First second of the visible window")
                        .required(false)
                        .value_parser(value_parser!(f64))
                        .default_value("0"),
                )
                .arg(
                    arg!(--end <SECONDS> "Last second of the visible window")
                        .required(false)
                        .value_parser(value_parser!(f64))
                        .default_value("3.5"),
                )
                .arg(
                    arg!(--padding <PX> "Gap between waveform bars")
                        .required(false)
                        .value_parser(value_parser!(usize))
                        .default_value("2"),
                )
                .arg(
                    arg!(--"bar-width" <PX> "Width of each waveform bar")
                        .required(false)
                        .value_parser(value_parser!(usize))
                        .default_value("3"),
                )
                .arg(
                    arg!(--"tick-columns" <N> "Drawn columns of audio per marker step")
                        .required(false)
                        .value_parser(value_parser!(u32))
                        .default_value("5"),
                )
                .arg(
                    arg!(--"marker-speed" <MODE> "per-file or first-file")
                        .required(false)
                        .value_parser(value_parser!(MarkerSpeed))
                        .default_value("per-file"),
                )
                .arg(
                    arg!(--gain <FACTOR> "Playback volume multiplier")
                        .required(false)
                        .value_parser(value_parser!(f32))
                        .default_value("1.0"),
                )
                .arg(arg!(--device <NAME> "Audio output device").required(false)),
        )
        .subcommand(Command::new("devices").about("List audio output devices"))
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let matches = cli().get_matches();

    match matches.subcommand() {
        Some(("view", sub_matches)) => run(ViewerConfig::from_matches(sub_matches)?),
        Some(("devices", _)) => {
            for name in output_device_names()? {
                println!("{name}");
            }
            Ok(())
        }
        _ => unreachable!(),
    }
}
