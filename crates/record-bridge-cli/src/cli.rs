//! Command line parsing.
//!
//! The binary has no options: every launch argument, whatever it looks like, only counts towards
//! selecting the calling convention.

use std::ffi::OsString;

use clap::{App, AppSettings, Arg};

use crate::binding::Convention;

const ARGS: &'static str = "ARGS";

pub fn app() -> App<'static, 'static> {
    App::new("record-bridge")
        .about("Hands a record to native code and prints it before and after the call")
        .setting(AppSettings::TrailingVarArg)
        .setting(AppSettings::AllowLeadingHyphen)
        .setting(AppSettings::DisableHelpFlags)
        .setting(AppSettings::DisableVersion)
        .arg(
            Arg::with_name(ARGS)
                .multiple(true)
                .help("Any argument selects the raw entry point"),
        )
}

pub fn parse_convention<I, T>(args: I) -> Result<Convention, clap::Error>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let matches = app().get_matches_from_safe(args)?;
    let count = matches.values_of_os(ARGS).map(|v| v.count()).unwrap_or(0);
    Ok(Convention::from_arg_count(count))
}
