//! Command line entry point for TypeScript code generation.
mod config;
mod extract;
mod fs;

use std::path::Path;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use anyhow::Result;
use apollo_typegen::Configuration;
use apollo_typegen::GenerateOutput;
use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

use crate::extract::TaggedTemplateExtractor;
use crate::fs::FsSchemaLoader;
use crate::fs::FsWriter;
use crate::fs::GlobDocumentLoader;

/// CLI arguments. See <https://docs.rs/clap/latest/clap/_derive/index.html>
#[derive(Parser)]
#[command(name = "typegen", about = "Typed TypeScript code generation for GraphQL operations")]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(clap::Subcommand)]
enum Command {
    /// Generates every configured destination
    Generate {
        /// Configuration file, YAML or JSON. Paths inside it are relative to its directory.
        #[arg(short, long = "config", env = "TYPEGEN_CONFIG", default_value = "codegen.yml")]
        config_path: PathBuf,

        /// Only report errors
        #[arg(short, long, conflicts_with = "verbose")]
        quiet: bool,

        /// Report every loaded source and written artifact
        #[arg(short, long)]
        verbose: bool,
    },
    /// Prints the JSON schema of the configuration file
    ConfigSchema,
}

fn main() -> ExitCode {
    let args = Args::parse();
    let result = match args.command {
        Command::Generate {
            config_path,
            quiet,
            verbose,
        } => init_tracing(quiet, verbose).and_then(|()| generate(&config_path)),
        Command::ConfigSchema => config_schema(),
    };
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            eprintln!("error: {error:#}");
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(quiet: bool, verbose: bool) -> Result<()> {
    let default = if quiet {
        "error"
    } else if verbose {
        "apollo_typegen=debug,typegen=debug,info"
    } else {
        "info"
    };
    let env_filter = std::env::var("TYPEGEN_LOG").unwrap_or_else(|_| default.to_owned());
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_new(&env_filter).context("could not parse TYPEGEN_LOG")?)
        .with_writer(std::io::stderr)
        .with_target(verbose)
        .without_time()
        .init();
    Ok(())
}

fn generate(config_path: &Path) -> Result<()> {
    let configuration = config::load(config_path)?;
    let root = config_path
        .parent()
        .filter(|parent| !parent.as_os_str().is_empty())
        .unwrap_or(Path::new("."));
    let output = run(&configuration, root)?;
    output
        .write(&FsWriter::new(root))
        .context("could not write artifacts")?;
    tracing::info!(
        artifacts = output.artifacts.len(),
        warnings = output.warnings.len(),
        "generated {}",
        output
            .artifacts
            .keys()
            .map(|path| path.display().to_string())
            .collect::<Vec<_>>()
            .join(", ")
    );
    Ok(())
}

fn run(configuration: &Configuration, root: &Path) -> Result<GenerateOutput> {
    let gql_tag_name = configuration
        .config
        .get("gqlTagName")
        .and_then(|name| name.as_str())
        .unwrap_or("graphql");
    let extractor = TaggedTemplateExtractor::new(&[gql_tag_name, "gql"])?;
    let output = apollo_typegen::generate(
        configuration,
        &FsSchemaLoader::new(root),
        &GlobDocumentLoader::new(root, extractor),
        &CancellationToken::new(),
    )?;
    Ok(output)
}

fn config_schema() -> Result<()> {
    let schema = apollo_typegen::configuration::generate_config_schema();
    println!("{}", serde_json::to_string_pretty(&schema)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn generates_into_the_configuration_directory() {
        let dir = tempfile::tempdir().unwrap();
        let write = |path: &str, text: &str| {
            let path = dir.path().join(path);
            std::fs::create_dir_all(path.parent().unwrap()).unwrap();
            std::fs::write(path, text).unwrap();
        };
        write("schema.graphql", "type Query { me: User } type User { id: ID! }");
        write(
            "src/app.tsx",
            "export const Me = graphql(`query Me { me { id } }`);",
        );
        write(
            "codegen.yml",
            "schema: schema.graphql\ndocuments: 'src/**/*.tsx'\ngenerates:\n  src/gql/:\n    preset: client\n",
        );

        generate(&dir.path().join("codegen.yml")).unwrap();
        let index = std::fs::read_to_string(dir.path().join("src/gql/index.ts")).unwrap();
        insta::assert_snapshot!(index, @r#"
        export * from "./fragment-masking";
        export * from "./gql";
        "#);
        let gql = std::fs::read_to_string(dir.path().join("src/gql/gql.ts")).unwrap();
        assert!(gql.contains("\"query Me { me { id } }\": types.MeDocument,"));

        // Generated files are excluded from the next run's documents.
        generate(&dir.path().join("codegen.yml")).unwrap();
        assert_eq!(
            std::fs::read_to_string(dir.path().join("src/gql/gql.ts")).unwrap(),
            gql
        );
    }

    #[test]
    fn arguments() {
        let args = Args::try_parse_from(["typegen", "generate", "-c", "ci.yml", "--quiet"]).unwrap();
        let Command::Generate {
            config_path,
            quiet,
            verbose,
        } = args.command
        else {
            panic!("expected generate");
        };
        assert_eq!(config_path, PathBuf::from("ci.yml"));
        assert!(quiet);
        assert!(!verbose);
        assert!(Args::try_parse_from(["typegen", "generate", "-q", "-v"]).is_err());
    }
}
