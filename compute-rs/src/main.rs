use compute::cli::{self, CliArgs, Input};
use compute::compute::{Delimiters, Engine};
use compute::config::Config;
use compute::var::Vars;
use tracing_subscriber::EnvFilter;

fn init_logging(debug: bool) {
    let default = if debug { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run(args: CliArgs) -> Result<String, String> {
    // ── Settings file ─────────────────────────────────────────────────────────
    let config = match &args.config {
        Some(path) => {
            let (config, errors) = Config::load_file(path)
                .map_err(|e| format!("{}: {e}", path.display()))?;
            for e in &errors {
                eprintln!("compute: warning: {}: {e}", path.display());
            }
            config
        }
        None => Config::new(),
    };

    let mut settings = config.settings().map_err(|e| e.to_string())?;
    if let Some((start, end)) = args.delimiters {
        let delimiters = Delimiters::new(start, end).map_err(|e| e.to_string())?;
        settings = settings.with_delimiters(delimiters);
    }
    let engine = Engine::with_settings(settings);
    tracing::debug!(?engine, "engine ready");

    // ── Variables (-v, evaluated in order) ────────────────────────────────────
    let mut vars: Vars = config.vars;
    for (name, expr) in &args.vars {
        let value = engine.run_with(expr, &vars).map_err(|e| format!("-v {name}: {e}"))?;
        vars.set(name.as_str(), value);
    }

    match args.input {
        Input::Expr(src) => engine
            .run_with(&src, &vars)
            .map(|v| v.to_string())
            .map_err(|e| e.to_string()),
        Input::Template(src) => engine.render(&src, &vars).map_err(|e| e.to_string()),
        Input::None => Err("no expression or template given".to_owned()),
    }
}

fn main() {
    let args = match cli::parse_args() {
        Ok(a) => a,
        Err(e) => {
            eprintln!("compute: {e}");
            eprintln!(
                "Usage: compute [-d] [-f<file>] [-D<start> <end>] [-v<name>=<expr>]... (-e <expr> | -t <template> | <expr>)"
            );
            std::process::exit(1);
        }
    };
    init_logging(args.debug);

    match run(args) {
        Ok(out) => println!("{out}"),
        Err(e) => {
            eprintln!("compute: {e}");
            std::process::exit(1);
        }
    }
}
