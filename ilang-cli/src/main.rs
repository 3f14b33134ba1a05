//! Entrypoint for CLI
use std::{
    env,
    error::Error,
    fs, io,
    path::{Path, PathBuf},
    process::Command,
};

use ilang::prelude::*;
use log::{error, info};
use serde_yaml::with::singleton_map_recursive;

static USAGE: &str = r#"
usage: ilc CMD FILE [OUTDIR]

commands:
    build   Optimize, check and generate assembly units into OUTDIR
            (defaults to output/<file stem>/)
    check   Optimize and check the program without generating code
    dump    Print the optimized program tree

environment:
    ILC_MAIN_CLASS  Name of the primary unit (default: Main)
    ILC_ASSEMBLER   Command run in OUTDIR with the written files appended
    RUST_LOG        Log level

examples:
    ilc build fib.yaml
    ilc check fib.yaml
    ilc dump fib.yaml
"#;

/// Reads a program tree serialized as YAML, with enum variants written
/// as single key maps.
fn read_program(filepath: impl AsRef<Path>) -> Result<Program, Box<dyn Error>> {
    let source = fs::read_to_string(filepath.as_ref())?;
    let program = singleton_map_recursive::deserialize(serde_yaml::Deserializer::from_str(&source))?;
    Ok(program)
}

fn gen_conf() -> GenConf {
    match env::var("ILC_MAIN_CLASS") {
        Ok(name) if !name.is_empty() => GenConf {
            main_class: name.into(),
        },
        _ => GenConf::default(),
    }
}

fn run_build(filepath: String, outdir: Option<String>) -> Result<(), Box<dyn Error>> {
    info!("building {filepath}");

    let program = read_program(&filepath)?;
    let units = ilang::compile(program, gen_conf())?;

    let outdir = match outdir {
        Some(dir) => PathBuf::from(dir),
        None => {
            let stem = Path::new(&filepath)
                .file_stem()
                .map(|stem| stem.to_string_lossy().into_owned())
                .unwrap_or_else(|| "out".to_string());
            Path::new("output").join(stem)
        }
    };

    let paths = write_units(&outdir, &units)?;
    for path in &paths {
        println!("{}", path.display());
    }

    if let Ok(assembler) = env::var("ILC_ASSEMBLER") {
        run_assembler(&assembler, &outdir, &paths)?;
    }

    Ok(())
}

/// Hands the written units over to the external assembler.
fn run_assembler(command: &str, outdir: &Path, paths: &[PathBuf]) -> Result<(), Box<dyn Error>> {
    let mut parts = command.split_whitespace();
    let program = match parts.next() {
        Some(program) => program,
        None => return Ok(()),
    };

    info!("running assembler {program}");
    let status = Command::new(program)
        .args(parts)
        .args(paths.iter().filter_map(|path| path.file_name()))
        .current_dir(outdir)
        .status()?;

    if status.success() {
        info!("assembler finished");
        Ok(())
    } else {
        error!("assembler failed: {status}");
        Err(Box::new(io::Error::new(
            io::ErrorKind::Other,
            format!("assembler exited with {status}"),
        )))
    }
}

fn run_check(filepath: String) -> Result<(), Box<dyn Error>> {
    let program = ilang::optimize(read_program(&filepath)?);

    match ilang::check(&program) {
        Ok(()) => {
            println!("{filepath}: ok");
            Ok(())
        }
        Err(err) => {
            error!("{filepath}: {err}");
            Err(err.into())
        }
    }
}

fn run_dump(filepath: String) -> Result<(), Box<dyn Error>> {
    let program = ilang::optimize(read_program(&filepath)?);

    let stdout = io::stdout();
    let mut serializer = serde_yaml::Serializer::new(stdout.lock());
    singleton_map_recursive::serialize(&program, &mut serializer)?;

    Ok(())
}

fn main() -> Result<(), Box<dyn Error>> {
    simple_logger::SimpleLogger::new().env().init()?;

    match parse_args() {
        Some(Cmd::Build { filepath, outdir }) => run_build(filepath, outdir)?,
        Some(Cmd::Check { filepath }) => run_check(filepath)?,
        Some(Cmd::Dump { filepath }) => run_dump(filepath)?,
        None => {
            print_usage();
            // FreeBSD EX_USAGE (64)
            std::process::exit(64)
        }
    }

    Ok(())
}

fn parse_args() -> Option<Cmd> {
    let mut args = env::args().skip(1);
    let cmd = args.next()?;

    match cmd.as_str() {
        "build" => Some(Cmd::Build {
            filepath: args.next()?,
            outdir: args.next(),
        }),
        "check" => Some(Cmd::Check {
            filepath: args.next()?,
        }),
        "dump" => Some(Cmd::Dump {
            filepath: args.next()?,
        }),
        _ => None,
    }
}

fn print_usage() {
    println!("ilc v{}", env!("CARGO_PKG_VERSION"));
    println!("{USAGE}");
}

enum Cmd {
    /// Generate assembly units
    Build { filepath: String, outdir: Option<String> },
    /// Verify only
    Check { filepath: String },
    /// Print optimized tree
    Dump { filepath: String },
}
