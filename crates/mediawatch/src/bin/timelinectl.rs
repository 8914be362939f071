//! Operator CLI over Timelines.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use mediawatch::config::Config;
use mediawatch::errors::{CoreError, CoreResult};
use mediawatch::segment::SegmentArchive;
use mediawatch::timeline::{Timeline, GLOB_NAME};

#[derive(Parser)]
#[command(name = "timelinectl", about = "Operator surface over capture timelines")]
struct Cli {
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    action: Action,

    /// Arguments after `--`, passed through to the invoked external tool
    /// (e.g. an alternate editor flag set for `edit`).
    #[arg(last = true)]
    passthrough: Vec<String>,
}

#[derive(Subcommand)]
enum Action {
    Create {
        name: String,
        #[arg(short = 'd', long, default_value_t = 0.0)]
        duration: f64,
    },
    Advance {
        name: String,
        #[arg(short = 't', long, default_value_t = 0.0)]
        truncate: f64,
    },
    Reset {
        name: String,
    },
    Copy {
        src: String,
        dst: String,
    },
    Edit {
        name: String,
    },
    Remove {
        name: String,
    },
    List,
    Slices {
        name: String,
    },
    Concat {
        name: String,
        #[arg(short = 's', long)]
        index: usize,
        #[arg(long)]
        with_trims: bool,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::from(err.exit_code() as u8)
        }
    }
}

fn run(cli: Cli) -> CoreResult<()> {
    let config = Config::load(cli.config.as_deref())?;
    let archive = SegmentArchive::new(config.get("INGEST_DATADIR")?);

    match cli.action {
        Action::Create { name, duration } => {
            let timeline = Timeline::open(&archive, &name, None, Some(duration), false)?;
            timeline.save()?;
            println!("created {} begin={} duration={}", timeline.name, timeline.begin, timeline.duration);
        }
        Action::Advance { name, truncate } => {
            let timeline = Timeline::open(&archive, &name, None, None, true)?;
            let advanced = timeline.advance(truncate)?;
            advanced.save()?;
            println!("advanced {} begin={} duration={}", advanced.name, advanced.begin, advanced.duration);
        }
        Action::Reset { name } => {
            let timeline = Timeline::open(&archive, &name, None, None, true)?;
            let reset = timeline.reset()?;
            reset.save()?;
            println!("reset {} begin={} duration={}", reset.name, reset.begin, reset.duration);
        }
        Action::Copy { src, dst } => {
            let timeline = Timeline::open(&archive, &src, None, None, true)?;
            let copied = timeline.copy(&dst)?;
            println!("copied {} -> {}", src, copied.name);
        }
        Action::Edit { name } => {
            edit_timeline(&archive, &name)?;
        }
        Action::Remove { name } => {
            let timeline = Timeline::open(&archive, &name, None, None, true)?;
            timeline.remove()?;
            println!("removed {name}");
        }
        Action::List => {
            list_timelines(&archive)?;
        }
        Action::Slices { name } => {
            let timeline = Timeline::open(&archive, &name, None, None, true)?;
            print_slices(&timeline);
        }
        Action::Concat { name, index, with_trims } => {
            let timeline = Timeline::open(&archive, &name, None, None, true)?;
            let slices = timeline.slices();
            let slice = slices
                .get(index)
                .ok_or_else(|| CoreError::not_found(format!("slice index {index} out of range")))?;
            let manifest = slice.concat_manifest(&archive.tmp_dir(), &name, with_trims)?;
            let body = std::fs::read_to_string(manifest.path())?;
            print!("{body}");
        }
    }
    Ok(())
}

fn list_timelines(archive: &SegmentArchive) -> CoreResult<()> {
    let dir = archive.timelines_dir();
    println!("{:<24} {:<20} {:>10} {:>10}", "NAME", "BEGIN", "DURATION", "NUM_HOLES");
    if !dir.exists() {
        return Ok(());
    }
    let mut names = Vec::new();
    for entry in std::fs::read_dir(&dir)? {
        let entry = entry?;
        if let Some(stem) = entry.path().file_stem().and_then(|s| s.to_str()) {
            names.push(stem.to_string());
        }
    }
    names.sort();
    for name in names {
        let timeline = Timeline::open(archive, &name, None, None, true)?;
        println!(
            "{:<24} {:<20} {:>10} {:>10}",
            timeline.name,
            timeline.begin,
            timeline.duration,
            timeline.hole_count()
        );
    }
    Ok(())
}

fn print_slices(timeline: &Timeline) {
    for (i, slice) in timeline.slices().iter().enumerate() {
        println!(
            "[{i}] segments={} effective_duration={} last={}",
            slice.segments().len(),
            slice.effective_duration(),
            slice.last
        );
    }
}

#[cfg(unix)]
fn edit_timeline(archive: &SegmentArchive, name: &str) -> CoreResult<()> {
    use std::os::unix::process::CommandExt;

    Timeline::validate_name(name)?;
    if name == GLOB_NAME {
        return Err(CoreError::InvalidArgument(format!("cannot edit {GLOB_NAME}")));
    }
    // Always pre-materialize the timeline's JSON with a sensibly-defaulted
    // window before handing off to the editor, so editing a timeline that
    // was never explicitly created still opens prefilled content.
    let timeline = Timeline::open(archive, name, None, None, true)?;
    timeline.save()?;

    let editor = std::env::var("EDITOR")
        .map_err(|_| CoreError::InvalidArgument("EDITOR is not set".to_string()))?;
    let path = archive.timelines_dir().join(format!("{name}.json"));

    let err = std::process::Command::new(editor).arg(&path).exec();
    Err(CoreError::Internal(format!("failed to exec editor: {err}")))
}

#[cfg(not(unix))]
fn edit_timeline(archive: &SegmentArchive, name: &str) -> CoreResult<()> {
    Timeline::validate_name(name)?;
    if name == GLOB_NAME {
        return Err(CoreError::InvalidArgument(format!("cannot edit {GLOB_NAME}")));
    }
    let timeline = Timeline::open(archive, name, None, None, true)?;
    timeline.save()?;

    let editor = std::env::var("EDITOR")
        .map_err(|_| CoreError::InvalidArgument("EDITOR is not set".to_string()))?;
    let path = archive.timelines_dir().join(format!("{name}.json"));
    let status = std::process::Command::new(editor).arg(&path).status()?;
    std::process::exit(status.code().unwrap_or(0));
}
