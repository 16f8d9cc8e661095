//! Build configuration.
//!
//! Settings are layered: built-in defaults, then an optional TOML file, then command line
//! flags.

use std::fs;
use std::path::{Path, PathBuf};

use clap::Parser;
use serde::Deserialize;

use crate::codepoints::EMOJI_CODEPOINTS;
use crate::error::BuildError;
use crate::pua::{PUA_FIRST, PUA_LAST};
use crate::tag;

pub const DEFAULT_INPUT: &str = "/tmp/NotoEmoji-Regular.ttf";
pub const DEFAULT_OUTPUT: &str = "/tmp/NotoEmoji-PUA.ttf";
pub const DEFAULT_JS_OUTPUT: &str = "lib/emoji-font.js";
pub const DEFAULT_CONST_NAME: &str = "EMOJI_FONT_BASE64";

/// Tables removed from the output font. They refer to glyphs or codepoints that no longer
/// exist after subsetting and remapping.
pub const DEFAULT_STRIP_TABLES: [&str; 8] =
    ["GSUB", "GPOS", "GDEF", "fvar", "gvar", "HVAR", "VVAR", "STAT"];

/// PUA codepoints looked up when verifying the output font.
pub const DEFAULT_VERIFY_SAMPLES: [u32; 8] =
    [0xE000, 0xE009, 0xE014, 0xE015, 0xE01F, 0xE03B, 0xE05F, 0xE069];

const JS_RESERVED_WORDS: &[&str] = &[
    "await", "break", "case", "catch", "class", "const", "continue", "debugger", "default",
    "delete", "do", "else", "enum", "export", "extends", "false", "finally", "for",
    "function", "if", "import", "in", "instanceof", "let", "new", "null", "return", "static",
    "super", "switch", "this", "throw", "true", "try", "typeof", "var", "void", "while",
    "with", "yield",
];

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Source TrueType font
    pub input: PathBuf,
    /// Where the remapped font is saved
    pub output: PathBuf,
    /// Where the JavaScript module is written
    pub js_output: PathBuf,
    /// Name of the JavaScript constant holding the base64 font
    pub const_name: String,
    /// Whether to write the JavaScript module at all
    pub emit_js: bool,
    /// The first PUA codepoint assigned
    pub pua_start: u32,
    /// Emoji to include, in PUA assignment order
    pub codepoints: Vec<u32>,
    /// Tags of the tables removed from the output font
    pub strip_tables: Vec<String>,
    /// PUA codepoints reported on during verification
    pub verify_samples: Vec<u32>,
    /// Fail when an emoji is missing from the subset font instead of skipping it
    pub strict: bool,
}

/// Build a Private Use Area emoji font and its base64 JavaScript module.
#[derive(Debug, Default, Parser)]
#[command(version, about)]
pub struct Args {
    /// TOML configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// source font, /tmp/NotoEmoji-Regular.ttf by default
    #[arg(short, long)]
    pub input: Option<PathBuf>,

    /// output font, /tmp/NotoEmoji-PUA.ttf by default
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// JavaScript module to write, lib/emoji-font.js by default
    #[arg(long)]
    pub js_output: Option<PathBuf>,

    /// name of the JavaScript constant
    #[arg(long)]
    pub const_name: Option<String>,

    /// fail if an emoji is lost during subsetting
    #[arg(long)]
    pub strict: bool,

    /// don't write the JavaScript module
    #[arg(long)]
    pub no_js: bool,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            input: PathBuf::from(DEFAULT_INPUT),
            output: PathBuf::from(DEFAULT_OUTPUT),
            js_output: PathBuf::from(DEFAULT_JS_OUTPUT),
            const_name: DEFAULT_CONST_NAME.to_string(),
            emit_js: true,
            pua_start: PUA_FIRST,
            codepoints: EMOJI_CODEPOINTS.to_vec(),
            strip_tables: DEFAULT_STRIP_TABLES.iter().map(|s| s.to_string()).collect(),
            verify_samples: DEFAULT_VERIFY_SAMPLES.to_vec(),
            strict: false,
        }
    }
}

impl Config {
    /// Parse a TOML document. Keys that are left out keep their defaults.
    pub fn from_toml(text: &str) -> Result<Self, BuildError> {
        toml::from_str::<Self>(text).map_err(|err| BuildError::Config(err.to_string()))
    }

    /// Read a TOML configuration file.
    pub fn from_file(path: &Path) -> Result<Self, BuildError> {
        let text = fs::read_to_string(path).map_err(|err| BuildError::io(path, err))?;
        toml::from_str::<Self>(&text)
            .map_err(|err| BuildError::Config(format!("{}: {}", path.display(), err)))
    }

    /// The configuration described by `args`: the file named by `--config` or the defaults,
    /// with the remaining flags applied on top. The result is validated.
    pub fn load(args: &Args) -> Result<Self, BuildError> {
        let mut config = match &args.config {
            Some(path) => Config::from_file(path)?,
            None => Config::default(),
        };
        config.apply_args(args);
        config.validate()?;
        Ok(config)
    }

    /// Override settings with the flags given on the command line.
    pub fn apply_args(&mut self, args: &Args) {
        if let Some(input) = &args.input {
            self.input = input.clone();
        }
        if let Some(output) = &args.output {
            self.output = output.clone();
        }
        if let Some(js_output) = &args.js_output {
            self.js_output = js_output.clone();
        }
        if let Some(const_name) = &args.const_name {
            self.const_name = const_name.clone();
        }
        self.strict |= args.strict;
        if args.no_js {
            self.emit_js = false;
        }
    }

    pub fn validate(&self) -> Result<(), BuildError> {
        if !(PUA_FIRST..=PUA_LAST).contains(&self.pua_start) {
            return Err(BuildError::Config(format!(
                "pua_start U+{:04X} is outside the Private Use Area U+{:04X}..U+{:04X}",
                self.pua_start, PUA_FIRST, PUA_LAST
            )));
        }
        if !is_js_identifier(&self.const_name) {
            return Err(BuildError::Config(format!(
                "const_name '{}' is not a valid JavaScript identifier",
                self.const_name
            )));
        }
        if let Some(ch) = self
            .codepoints
            .iter()
            .find(|&&ch| char::from_u32(ch).is_none())
        {
            return Err(BuildError::Config(format!(
                "0x{:X} is not a Unicode scalar value",
                ch
            )));
        }
        self.strip_tags()?;
        Ok(())
    }

    /// The tags of `strip_tables`.
    pub fn strip_tags(&self) -> Result<Vec<u32>, BuildError> {
        self.strip_tables
            .iter()
            .map(|name| {
                tag::from_string(name)
                    .map_err(|_| BuildError::Config(format!("'{}' is not a table tag", name)))
            })
            .collect()
    }
}

fn is_js_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    let is_start = |c: char| c.is_ascii_alphabetic() || c == '_' || c == '$';
    is_start(first)
        && chars.all(|c| is_start(c) || c.is_ascii_digit())
        && !JS_RESERVED_WORDS.contains(&name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = Config::default();
        assert_eq!(config.input, Path::new("/tmp/NotoEmoji-Regular.ttf"));
        assert_eq!(config.output, Path::new("/tmp/NotoEmoji-PUA.ttf"));
        assert_eq!(config.js_output, Path::new("lib/emoji-font.js"));
        assert_eq!(config.const_name, "EMOJI_FONT_BASE64");
        assert_eq!(config.pua_start, 0xE000);
        assert_eq!(config.codepoints.len(), EMOJI_CODEPOINTS.len());
        assert!(config.emit_js);
        assert!(!config.strict);
        assert_eq!(
            config.strip_tags().unwrap(),
            vec![
                tag::GSUB,
                tag::GPOS,
                tag::GDEF,
                tag::FVAR,
                tag::GVAR,
                tag::HVAR,
                tag::VVAR,
                tag::STAT
            ]
        );
        assert!(config.validate().is_ok());
    }

    #[test]
    fn toml_overrides_defaults() {
        let config = Config::from_toml(
            r#"
            input = "fonts/emoji.ttf"
            pua_start = 0xE100
            codepoints = [0x2600, 0x1F600]
            strip_tables = ["GSUB", "cvt"]
            "#,
        )
        .unwrap();
        assert_eq!(config.input, Path::new("fonts/emoji.ttf"));
        assert_eq!(config.output, Path::new(DEFAULT_OUTPUT));
        assert_eq!(config.pua_start, 0xE100);
        assert_eq!(config.codepoints, vec![0x2600, 0x1F600]);
        assert_eq!(config.strip_tags().unwrap(), vec![tag::GSUB, tag::CVT]);
    }

    #[test]
    fn unknown_key_is_rejected() {
        assert!(matches!(
            Config::from_toml("inptu = 'typo.ttf'"),
            Err(BuildError::Config(_))
        ));
    }

    #[test]
    fn args_override_config() {
        let args = Args::try_parse_from([
            "emoji-pua-font",
            "--input",
            "a.ttf",
            "--js-output",
            "out/font.js",
            "--const-name",
            "FONT",
            "--strict",
            "--no-js",
        ])
        .unwrap();
        let mut config = Config::from_toml("output = 'b.ttf'\nconst_name = 'OTHER'").unwrap();
        config.apply_args(&args);
        assert_eq!(config.input, Path::new("a.ttf"));
        assert_eq!(config.output, Path::new("b.ttf"));
        assert_eq!(config.js_output, Path::new("out/font.js"));
        assert_eq!(config.const_name, "FONT");
        assert!(config.strict);
        assert!(!config.emit_js);
    }

    #[test]
    fn validation() {
        let invalid = |config: Config| matches!(config.validate(), Err(BuildError::Config(_)));

        assert!(invalid(Config {
            pua_start: 0xDFFF,
            ..Config::default()
        }));
        assert!(invalid(Config {
            pua_start: 0xF900,
            ..Config::default()
        }));
        assert!(invalid(Config {
            codepoints: vec![0x2600, 0xD800],
            ..Config::default()
        }));
        assert!(invalid(Config {
            strip_tables: vec!["GSUBS".to_string()],
            ..Config::default()
        }));
        assert!(invalid(Config {
            const_name: "1FONT".to_string(),
            ..Config::default()
        }));
        assert!(invalid(Config {
            const_name: "const".to_string(),
            ..Config::default()
        }));
        assert!(!invalid(Config {
            const_name: "$emoji_font2".to_string(),
            pua_start: 0xF8FF,
            ..Config::default()
        }));
    }
}
