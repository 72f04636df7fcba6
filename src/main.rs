use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, Level};
use tracing_subscriber::FmtSubscriber;

use etoomap::codegen::{self, CodeGenConfig, Extras, TemplateRef, TemplateSet, BUNDLED_SET};
use etoomap::config::ConnectionOptions;
use etoomap::introspect::Dialect;
use etoomap::reverser::DataSourceReverser;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Database {
    Postgres,
    Mysql,
}

impl From<Database> for Dialect {
    fn from(database: Database) -> Self {
        match database {
            Database::Postgres => Dialect::Postgres,
            Database::Mysql => Dialect::Mysql,
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "etoomap")]
#[command(version, about = "Entity to object mapper", long_about = None)]
struct Cli {
    /// Path to .env file for connection config
    #[arg(long, global = true, default_value = "./.env")]
    env_file: PathBuf,

    /// Verbose output (-v for debug, -vv for trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List schemas of the database
    Schemas {
        /// Source database type
        #[arg(long, value_enum)]
        database: Database,
    },
    /// List tables of a schema
    Tables(SchemaArgs),
    /// Print the introspected metadata of a table as JSON
    Inspect {
        #[command(flatten)]
        schema: SchemaArgs,

        /// Table to introspect
        #[arg(long)]
        table: String,
    },
    /// List the bundled and installed template sets
    Templates(RootArgs),
    /// List the templates of a template set
    TemplatesIn {
        /// Template set directory, the name of an installed set, or `default-templates`
        dir: PathBuf,

        #[command(flatten)]
        root: RootArgs,
    },
    /// Generate a file from a table
    Generate(GenerateArgs),
}

#[derive(Args, Debug)]
struct SchemaArgs {
    /// Source database type
    #[arg(long, value_enum)]
    database: Database,

    /// Database schema [default: public on Postgres, DB_NAME on MySQL]
    #[arg(long)]
    schema: Option<String>,
}

#[derive(Args, Debug)]
struct RootArgs {
    /// Directory holding installed template sets
    #[arg(long, env = "ETOOMAP_TEMPLATE_ROOT")]
    template_root: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct GenerateArgs {
    #[command(flatten)]
    schema: SchemaArgs,

    /// Table to generate from
    #[arg(long)]
    table: String,

    /// Template set directory, the name of an installed set, or `default-templates`
    #[arg(long, requires = "template", conflicts_with = "template_file")]
    template_dir: Option<PathBuf>,

    /// Template name within the template set
    #[arg(long)]
    template: Option<String>,

    /// Template file used directly, without a template set
    #[arg(long, requires = "extension")]
    template_file: Option<PathBuf>,

    /// Extension of the generated file (with --template-file)
    #[arg(long)]
    extension: Option<String>,

    /// Target language (with --template-file)
    #[arg(long, default_value = "java")]
    language: String,

    /// Package name passed to the template as `packageName`
    #[arg(long)]
    package: Option<String>,

    /// Additional template values, KEY=VALUE
    #[arg(long = "extra", value_parser = parse_extra)]
    extras: Vec<(String, String)>,

    /// Output directory
    #[arg(short, long, default_value = ".")]
    output: PathBuf,

    /// Print the result instead of writing a file
    #[arg(long)]
    stdout: bool,

    #[command(flatten)]
    root: RootArgs,
}

fn main() {
    if let Err(e) = run() {
        error!(error = ?e, "Fatal error");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    init_tracing(cli.verbose);

    info!("etoomap v{}", env!("CARGO_PKG_VERSION"));

    match cli.command {
        Command::Schemas { database } => {
            let mut reverser = connect(&cli.env_file, database)?;
            let result = reverser.schema_list();
            reverser.close().context("Failed to close connection")?;
            for schema in result.context("Failed to list schemas")? {
                println!("{}", schema);
            }
        }
        Command::Tables(args) => {
            let (mut reverser, schema) = connect_schema(&cli.env_file, &args)?;
            let result = reverser.table_list(&schema);
            reverser.close().context("Failed to close connection")?;
            for table in result.context("Failed to list tables")? {
                println!("{}", table);
            }
        }
        Command::Inspect { schema, table } => {
            let (mut reverser, schema) = connect_schema(&cli.env_file, &schema)?;
            let result = reverser.table_info(&schema, &table);
            reverser.close().context("Failed to close connection")?;
            let table = result.context("Failed to introspect table")?;
            println!("{}", serde_json::to_string_pretty(&table)?);
        }
        Command::Templates(root) => {
            let root = template_root(&root)?;
            let mut dirs = if root.is_dir() {
                codegen::list_template_dirs(&root)
                    .with_context(|| format!("Failed to list template sets in {}", root.display()))?
            } else {
                info!(root = ?root, "No installed template sets");
                Vec::new()
            };
            if !dirs.iter().any(|dir| dir == BUNDLED_SET) {
                dirs.insert(0, BUNDLED_SET.to_string());
            }
            for dir in dirs {
                println!("{}", dir);
            }
        }
        Command::TemplatesIn { dir, root } => {
            let set = resolve_template_set(&dir, &root);
            let templates = set
                .list_templates()
                .with_context(|| format!("Failed to read templates of {:?}", set))?;
            for template in templates {
                println!(
                    "{}\t{}\t.{}\t{}",
                    template.name, template.language, template.extension, template.template_file
                );
            }
        }
        Command::Generate(args) => run_generate(&cli.env_file, args)?,
    }

    Ok(())
}

fn run_generate(env_file: &Path, args: GenerateArgs) -> Result<()> {
    let reference = match (&args.template_dir, &args.template, &args.template_file) {
        (Some(dir), Some(name), None) => resolve_template_set(dir, &args.root).template(name.clone()),
        (None, _, Some(path)) => TemplateRef::File {
            path: path.clone(),
            language: args.language.clone(),
            extension: args.extension.clone().unwrap_or_default(),
        },
        _ => bail!("Either --template-dir with --template, or --template-file is required"),
    };
    debug!(reference = ?reference, "Template reference");

    let mut extras = Extras::new();
    if let Some(package) = &args.package {
        extras.insert("packageName".to_string(), package.clone().into());
    }
    for (key, value) in &args.extras {
        extras.insert(key.clone(), value.clone().into());
    }

    let (mut reverser, schema) = connect_schema(env_file, &args.schema)?;
    let result = if args.stdout {
        reverser
            .generate(&schema, &args.table, &reference, &extras)
            .map(|text| print!("{}", text))
    } else {
        let config = CodeGenConfig::new(args.output.clone()).with_extras(extras);
        reverser
            .generate_and_export(&schema, &args.table, &reference, &config)
            .map(|path| info!(path = ?path, "Execution done"))
    };

    info!("Closing connection");
    reverser.close().context("Failed to close connection")?;

    result.with_context(|| format!("Failed to generate {}.{}", schema, args.table))
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => Level::INFO,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber).expect("Failed to set tracing subscriber");
}

type Reverser = DataSourceReverser<etoomap::introspect::DriverConnection>;

fn connect(env_file: &Path, database: Database) -> Result<Reverser> {
    connect_with_options(env_file, database).map(|(reverser, _)| reverser)
}

/// Connect and pick the schema: `--schema`, else the dialect's default
fn connect_schema(env_file: &Path, args: &SchemaArgs) -> Result<(Reverser, String)> {
    let (reverser, config) = connect_with_options(env_file, args.database)?;
    let schema = match &args.schema {
        Some(schema) => schema.clone(),
        None => config.default_schema(reverser.dialect()).to_string(),
    };
    debug!(schema = ?schema, "Using schema");
    Ok((reverser, schema))
}

fn connect_with_options(env_file: &Path, database: Database) -> Result<(Reverser, ConnectionOptions)> {
    let dialect = Dialect::from(database);

    // Load configuration
    let config = ConnectionOptions::load(env_file, dialect)
        .context("Failed to load database configuration")?;
    debug!(connection = ?config.redacted_connection_string(), "Loaded configuration");

    info!(dialect = %dialect, "Connecting to data source");
    let reverser = DataSourceReverser::connect(dialect, &config).with_context(|| {
        format!(
            "Failed to connect to {} at {}",
            dialect,
            config.redacted_connection_string()
        )
    })?;
    Ok((reverser, config))
}

/// Template root from the flag or environment, else the platform data directory
fn template_root(args: &RootArgs) -> Result<PathBuf> {
    if let Some(root) = &args.template_root {
        return Ok(root.clone());
    }

    let data_dir = if let Some(app_data) = std::env::var_os("APPDATA") {
        PathBuf::from(app_data)
    } else {
        let home = std::env::var_os("HOME").context("HOME is not set, pass --template-root")?;
        if cfg!(target_os = "macos") {
            PathBuf::from(home).join("Library/Preferences")
        } else {
            PathBuf::from(home).join(".local/share")
        }
    };

    Ok(data_dir.join("etoomap").join("templates"))
}

/// Template set named by `dir`: a path, an installed set, or the bundled one
fn resolve_template_set(dir: &Path, root: &RootArgs) -> TemplateSet {
    let root = template_root(root).ok();
    TemplateSet::resolve(dir, root.as_deref())
}

fn parse_extra(s: &str) -> Result<(String, String), String> {
    match s.split_once('=') {
        Some((key, value)) if !key.is_empty() => Ok((key.to_string(), value.to_string())),
        _ => Err(format!("expected KEY=VALUE, got '{}'", s)),
    }
}
