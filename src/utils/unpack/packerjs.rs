use std::{borrow::Cow, sync::OnceLock};

use log::debug;
use regex::{Captures, Regex, RegexBuilder};

use super::{
    unbaser::{parse_prefix, Unbaser},
    UnpackError,
};

/// Arguments of the `eval(function(p,a,c,k,e,d){...}(...))` wrapper call.
#[derive(Debug, PartialEq, Eq)]
pub struct PackedScriptArgs<'a> {
    pub payload: &'a str,
    pub symtab: Vec<&'a str>,
    pub radix: u32,
    pub count: usize,
}

/// Unpacks P.A.C.K.E.R. packed js code.
pub fn unpack(source: &str) -> Result<String, UnpackError> {
    static WORD_RE: OnceLock<Regex> = OnceLock::new();

    let args = filter_args(source)?;

    if args.count != args.symtab.len() {
        return Err(UnpackError::MalformedSymbolTable {
            expected: args.count,
            found: args.symtab.len(),
        });
    }

    // radix 1 tokens are plain decimal indices
    let unbaser = match args.radix {
        1 => None,
        radix => Some(Unbaser::new(radix)?),
    };

    let lookup = |word: &str| -> Option<usize> {
        match &unbaser {
            Some(unbaser) => unbaser.unbase(word),
            None => parse_prefix(word, 10).and_then(|idx| usize::try_from(idx).ok()),
        }
    };

    let sanitized_payload = args.payload.replace("\\\\", "\\").replace("\\'", "'");
    let unpacked = WORD_RE
        .get_or_init(|| Regex::new(r"[A-Za-z0-9_]+").unwrap())
        .replace_all(&sanitized_payload, |caps: &Captures| {
            let word = &caps[0];
            lookup(word)
                .and_then(|idx| args.symtab.get(idx).copied())
                .filter(|sym| !sym.is_empty())
                .unwrap_or(word)
                .to_owned()
        });

    debug!(
        "unpacked {} symbols with radix {}",
        args.symtab.len(),
        args.radix
    );

    Ok(unpacked.into_owned())
}

/// Unpacks `source` when it is packed, returns it untouched otherwise.
pub fn unpack_if_packed(source: &str) -> Result<Cow<'_, str>, UnpackError> {
    if detect(source) {
        unpack(source).map(Cow::Owned)
    } else {
        Ok(Cow::Borrowed(source))
    }
}

pub fn detect(source: &str) -> bool {
    source
        .trim_start()
        .replace(' ', "")
        .starts_with("eval(function(p,a,c,k,e,")
}

pub fn filter_args(source: &str) -> Result<PackedScriptArgs<'_>, UnpackError> {
    static JUICER1: OnceLock<Regex> = OnceLock::new();
    static JUICER2: OnceLock<Regex> = OnceLock::new();

    let juicers = [
        JUICER1.get_or_init(|| {
            RegexBuilder::new(
                r"}\('(.*)', *(\d+|\[\]), *(\d+), *'(.*)'\.split\('\|'\), *(\d+), *(.*)\)\)",
            )
            .dot_matches_new_line(true)
            .build()
            .unwrap()
        }),
        JUICER2.get_or_init(|| {
            RegexBuilder::new(r"}\('(.*)', *(\d+|\[\]), *(\d+), *'(.*)'\.split\('\|'\)")
                .dot_matches_new_line(true)
                .build()
                .unwrap()
        }),
    ];

    juicers
        .into_iter()
        .find_map(|juicer| {
            let caps = juicer.captures(source)?;

            let radix = match caps.get(2)?.as_str() {
                "[]" => 62,
                radix => radix.parse::<u32>().ok()?,
            };

            Some(PackedScriptArgs {
                payload: caps.get(1)?.as_str(),
                symtab: caps.get(4)?.as_str().split('|').collect(),
                radix,
                count: caps.get(3)?.as_str().parse().ok()?,
            })
        })
        .ok_or(UnpackError::UnrecognizedFormat)
}
