use std::{
    fs,
    io::{self, BufRead, Write},
    path::PathBuf,
    process::ExitCode,
};

use certprefill::{
    ExpiryZone, FileContent, ParseOptions, ParsePipeline, PrefillError, PrefillErrorKind,
};
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use log::debug;

fn cli() -> Command {
    Command::new("certprefill")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Extract the name and expiry date of a certificate container.")
        .arg(
            Arg::new("file")
                .value_name("FILE")
                .help("A .p12, .pfx, .cer, .pem or .crt file.")
                .required(true)
                .value_parser(value_parser!(PathBuf)),
        )
        .arg(
            Arg::new("password")
                .short('p')
                .long("password")
                .value_name("PASSWORD")
                .help("Answer for the bundle password prompt, asked on stdin otherwise."),
        )
        .arg(
            Arg::new("utc")
                .long("utc")
                .help("Take the expiry date in UTC instead of local time.")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("max-size")
                .long("max-size")
                .value_name("BYTES")
                .help("Largest file accepted.")
                .value_parser(value_parser!(u64)),
        )
        .arg(
            Arg::new("json")
                .long("json")
                .help("Print the result as JSON.")
                .action(ArgAction::SetTrue),
        )
}

fn options(matches: &ArgMatches) -> ParseOptions {
    let mut options = ParseOptions::default();

    if matches.get_flag("utc") {
        options = options.expiry_zone(ExpiryZone::Utc);
    }
    if let Some(max_size) = matches.get_one::<u64>("max-size") {
        options = options.max_file_size(*max_size);
    }

    options
}

// Empty input is a valid password, end of input is no answer.
fn read_password(message: &str) -> Option<String> {
    eprint!("{} ", message);
    io::stderr().flush().ok()?;

    let mut line = String::new();
    match io::stdin().lock().read_line(&mut line) {
        Ok(0) | Err(_) => None,
        Ok(_) => Some(line.trim_end_matches(&['\r', '\n'][..]).to_owned()),
    }
}

fn main() -> ExitCode {
    env_logger::Builder::from_default_env()
        .format_timestamp_micros()
        .init();

    let matches = cli().get_matches();
    let Some(path) = matches.get_one::<PathBuf>("file") else {
        return ExitCode::FAILURE;
    };
    let preset_password = matches.get_one::<String>("password").cloned();
    let pipeline = ParsePipeline::new(options(&matches));

    let filename = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    let size = match fs::metadata(path) {
        Ok(metadata) => metadata.len(),
        Err(err) => {
            let err = PrefillError::new(PrefillErrorKind::IoError, err.to_string());
            eprintln!("{}: {}", path.display(), err);
            return ExitCode::FAILURE;
        }
    };

    let step = pipeline.parse_file(&filename, size, |mode| {
        debug!("reading {} as {:?}", path.display(), mode);
        FileContent::load(path, mode)
    });

    let outcome = step.resolve(&mut |message: &str| match &preset_password {
        Some(password) => Some(password.clone()),
        None => read_password(message),
    });

    match outcome {
        Ok(result) => {
            if matches.get_flag("json") {
                let value = serde_json::json!({
                    "suggestedName": result.suggested_name,
                    "expiryDate": result.expiry_date_input(),
                    "sourceFilename": result.source_filename,
                    "note": result.note,
                });
                println!("{:#}", value);
            } else {
                println!("name:   {}", result.suggested_name);
                println!("expiry: {}", result.expiry_date_input());
                println!("note:   {}", result.note);
            }
            ExitCode::SUCCESS
        }
        Err(err) => {
            debug!("{}", err);
            eprintln!("{}", err.user_message());
            ExitCode::FAILURE
        }
    }
}
