//! Command-line argument parsing.
//!
//! Usage:
//!   compute [-d] [-f<file>] [-D<start> <end>] [-v<name>=<expr>]... -e <expr>
//!   compute [-d] [-f<file>] [-D<start> <end>] [-v<name>=<expr>]... -t <template>
//!   compute [-d] [-f<file>] [-D<start> <end>] [-v<name>=<expr>]... <expr>

use std::path::PathBuf;

// ── Public types ──────────────────────────────────────────────────────────────

/// Parsed command-line arguments.
#[derive(Debug, Default)]
pub struct CliArgs {
    /// Settings file to load (`-f<file>`).
    pub config: Option<PathBuf>,
    /// Template delimiter override (`-D<start> <end>`).
    pub delimiters: Option<(String, String)>,
    /// Variable bindings in command-line order (`-v<name>=<expr>`).
    pub vars: Vec<(String, String)>,
    /// Debug logging (`-d`).
    pub debug: bool,
    /// What to evaluate.
    pub input: Input,
}

/// The text to evaluate and how to treat it.
#[derive(Debug, Default, PartialEq, Eq)]
pub enum Input {
    /// Nothing given; an error by the time parsing finishes.
    #[default]
    None,
    /// An expression (`-e <expr>` or a positional argument).
    Expr(String),
    /// A template rendered against the variables (`-t <template>`).
    Template(String),
}

// ── Parsing ───────────────────────────────────────────────────────────────────

/// Parse `std::env::args()` and return [`CliArgs`] or an error message.
pub fn parse_args() -> Result<CliArgs, String> {
    let raw: Vec<String> = std::env::args().collect();
    parse_argv(raw.get(1..).unwrap_or_default())
}

/// Value for an option: the rest of this token, or the next argument.
fn option_value(
    chars: &[char],
    j: &mut usize,
    argv: &[String],
    i: &mut usize,
    flag: char,
    what: &str,
) -> Result<String, String> {
    if *j + 1 < chars.len() {
        let s: String = chars[*j + 1..].iter().collect();
        *j = chars.len(); // consumed rest of this arg
        Ok(s)
    } else if *i + 1 < argv.len() {
        *i += 1;
        Ok(argv[*i].clone())
    } else {
        Err(format!("-{flag} requires {what}"))
    }
}

fn set_input(args: &mut CliArgs, input: Input) -> Result<(), String> {
    if args.input != Input::None {
        return Err("only one expression or template may be given".to_owned());
    }
    args.input = input;
    Ok(())
}

/// Parse a slice of argument strings (exposed for testing).
pub fn parse_argv(argv: &[String]) -> Result<CliArgs, String> {
    let mut args = CliArgs::default();
    let mut i = 0;

    while i < argv.len() {
        let arg = argv[i].as_str();

        // `--` ends flag processing; the rest is one expression.
        if arg == "--" {
            let rest = argv[i + 1..].join(" ");
            set_input(&mut args, Input::Expr(rest))?;
            break;
        }

        // Non-flag argument. A leading `-` followed by a digit or `(` is a
        // negative expression, not an option.
        let looks_negative = arg
            .chars()
            .nth(1)
            .map_or(false, |c| c.is_ascii_digit() || c == '(' || c == ' ');
        if !arg.starts_with('-') || arg == "-" || looks_negative {
            set_input(&mut args, Input::Expr(arg.to_owned()))?;
            i += 1;
            continue;
        }

        // Flag argument: iterate over characters after the leading `-`.
        let chars: Vec<char> = arg[1..].chars().collect();
        let mut j = 0;
        while j < chars.len() {
            match chars[j] {
                'd' => args.debug = true,

                // -f<file>
                'f' => {
                    let file = option_value(&chars, &mut j, argv, &mut i, 'f', "a file argument")?;
                    args.config = Some(PathBuf::from(file));
                }

                // -D<start> <end>
                'D' => {
                    let what = "start and end delimiters";
                    let start = option_value(&chars, &mut j, argv, &mut i, 'D', what)?;
                    j = chars.len();
                    i += 1;
                    let end = argv
                        .get(i)
                        .cloned()
                        .ok_or_else(|| "-D requires start and end delimiters".to_owned())?;
                    args.delimiters = Some((start, end));
                }

                // -v<name>=<expr>
                'v' => {
                    let what = "a <name>=<expr> argument";
                    let binding = option_value(&chars, &mut j, argv, &mut i, 'v', what)?;
                    let (name, expr) = binding
                        .split_once('=')
                        .ok_or_else(|| format!("-v expects <name>=<expr>, got '{binding}'"))?;
                    if name.is_empty() {
                        return Err("-v: variable name cannot be empty".to_owned());
                    }
                    args.vars.push((name.to_owned(), expr.to_owned()));
                }

                'e' => {
                    let expr = option_value(&chars, &mut j, argv, &mut i, 'e', "an expression")?;
                    set_input(&mut args, Input::Expr(expr))?;
                }

                't' => {
                    let template = option_value(&chars, &mut j, argv, &mut i, 't', "a template")?;
                    set_input(&mut args, Input::Template(template))?;
                }

                c => return Err(format!("unknown option: -{c}")),
            }
            j += 1;
        }
        i += 1;
    }

    if args.input == Input::None {
        return Err("no expression or template given".to_owned());
    }
    Ok(args)
}

// ── Tests ─────────────────────────────────────────────────────────────────────
