//! Command-line arguments.

use std::path::PathBuf;

use crease_engine::{BatterHand, CameraOrientation, PitchCalibration};

use crate::analyzer::AnalysisOptions;

pub const USAGE: &str = "\
Usage:
  crease-worker analyze [<video>] [--fps N] [--mirrored] [--left-handed]
                        [--calibration x1,y1,x2,y2,x3,y3,x4,y4]
                        [--positions file.json] [--direct-hit]
  crease-worker split <video>

A video, --positions, or both are required for analyze. With both, the
positions replace ball detection and the video supplies timing and audio.";

#[derive(Debug, Clone)]
pub enum Command {
    Analyze {
        video: Option<PathBuf>,
        positions: Option<PathBuf>,
        options: AnalysisOptions,
    },
    Split {
        video: PathBuf,
    },
    Help,
}

/// Parse arguments, excluding the program name.
pub fn parse_args<I, S>(args: I) -> Result<Command, String>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let mut args = args.into_iter().map(Into::into);
    let Some(command) = args.next() else {
        return Ok(Command::Help);
    };

    match command.as_str() {
        "analyze" => parse_analyze(args),
        "split" => {
            let video = args.next().ok_or("split needs a video path")?;
            if let Some(extra) = args.next() {
                return Err(format!("unexpected argument: {}", extra));
            }
            Ok(Command::Split {
                video: PathBuf::from(video),
            })
        }
        "help" | "-h" | "--help" => Ok(Command::Help),
        other => Err(format!("unknown command: {}", other)),
    }
}

fn parse_analyze(mut args: impl Iterator<Item = String>) -> Result<Command, String> {
    let mut video = None;
    let mut positions = None;
    let mut options = AnalysisOptions::default();

    while let Some(arg) = args.next() {
        let mut value = |flag: &str| args.next().ok_or_else(|| format!("{} needs a value", flag));
        match arg.as_str() {
            "--fps" => {
                let fps: f64 = value("--fps")?
                    .parse()
                    .map_err(|_| "--fps must be a number".to_string())?;
                if !(fps.is_finite() && fps > 0.0) {
                    return Err("--fps must be positive".to_string());
                }
                options.fps = Some(fps);
            }
            "--mirrored" => options.orientation = CameraOrientation::Mirrored,
            "--left-handed" => options.batter = BatterHand::Left,
            "--direct-hit" => options.direct_stump_hit = true,
            "--calibration" => {
                let calibration =
                    PitchCalibration::parse(&value("--calibration")?).map_err(|e| e.to_string())?;
                options.calibration = Some(calibration);
            }
            "--positions" => positions = Some(PathBuf::from(value("--positions")?)),
            flag if flag.starts_with("--") => return Err(format!("unknown flag: {}", flag)),
            path if video.is_none() => video = Some(PathBuf::from(path)),
            extra => return Err(format!("unexpected argument: {}", extra)),
        }
    }

    if video.is_none() && positions.is_none() {
        return Err("analyze needs a video path or --positions".to_string());
    }

    Ok(Command::Analyze {
        video,
        positions,
        options,
    })
}
