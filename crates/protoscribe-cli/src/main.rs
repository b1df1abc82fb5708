//! Protoscribe CLI
//!
//! Pipeline:
//! 1. Run `buf build --as-file-descriptor-set -o descriptor.json`
//! 2. `protoscribe generate descriptor.json -o schemas/` writes one JSON
//!    Schema document per published type, named by its `$id`
//!
//! `--all-variants` fans out the eight historical proto/json x
//! lenient/strict x split/bundle combinations as independent engine
//! instances over the same pool, in parallel.

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use protoscribe_descriptor::DescriptorPool;
use protoscribe_jsonschema::{GenerationOptions, Generator};
use rayon::prelude::*;
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

#[derive(Parser)]
#[command(name = "protoscribe")]
#[command(
    author,
    version,
    about = "Project protobuf descriptors into JSON Schema documents"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate JSON Schema documents from a Buf descriptor-set JSON.
    Generate {
        /// Descriptor set JSON (from `buf build --as-file-descriptor-set`).
        descriptor: PathBuf,
        /// Output directory; one file per document, named by its `$id`.
        #[arg(short, long)]
        out: PathBuf,
        /// Root message types (fully qualified). Defaults to every
        /// top-level message in the set.
        #[arg(long = "type")]
        types: Vec<String>,
        /// Use JSON names as primary property names.
        #[arg(long)]
        json_names: bool,
        /// Disallow protobuf JSON leniencies (aliases, numbers as strings,
        /// implicit defaults).
        #[arg(long)]
        strict: bool,
        /// Bundle each root with its transitive dependencies into one
        /// self-contained document.
        #[arg(long)]
        bundle: bool,
        /// Emit `additionalProperties: true` on message objects.
        #[arg(long)]
        additional_properties: bool,
        /// Generate all eight proto/json x lenient/strict x split/bundle
        /// variants in one pass.
        #[arg(long, conflicts_with_all = ["json_names", "strict", "bundle"])]
        all_variants: bool,
    },

    /// List the message types in a descriptor set.
    Types {
        /// Descriptor set JSON.
        descriptor: PathBuf,
        /// Include nested message types.
        #[arg(long)]
        nested: bool,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Generate {
            descriptor,
            out,
            types,
            json_names,
            strict,
            bundle,
            additional_properties,
            all_variants,
        } => {
            let options = GenerationOptions {
                use_json_names: json_names,
                strict,
                allow_additional_properties: additional_properties,
                bundle,
            };
            cmd_generate(&descriptor, &out, &types, options, all_variants)
        }
        Commands::Types { descriptor, nested } => cmd_types(&descriptor, nested),
    }
}

fn cmd_generate(
    descriptor: &Path,
    out: &Path,
    types: &[String],
    options: GenerationOptions,
    all_variants: bool,
) -> Result<()> {
    let pool = load_pool(descriptor)?;
    let roots: Vec<String> = if types.is_empty() {
        pool.top_level_messages().to_vec()
    } else {
        types.to_vec()
    };
    if roots.is_empty() {
        return Err(anyhow!(
            "descriptor set contains no top-level message types"
        ));
    }
    fs::create_dir_all(out)
        .with_context(|| format!("creating output directory {}", out.display()))?;

    let variants = if all_variants {
        GenerationOptions::all_variants()
    } else {
        vec![options]
    };

    // Each variant is an independent engine instance over the shared,
    // immutable pool; no locking needed.
    let written = variants
        .par_iter()
        .map(|&variant| run_variant(&pool, variant, &roots, out))
        .collect::<Result<Vec<usize>>>()?;

    println!(
        "  {} {} document(s), {} variant(s)",
        "✓".green(),
        written.iter().sum::<usize>(),
        variants.len()
    );
    Ok(())
}

fn run_variant(
    pool: &DescriptorPool,
    options: GenerationOptions,
    roots: &[String],
    out: &Path,
) -> Result<usize> {
    debug!(?options, "running variant");
    let mut generator = Generator::new(pool, options);
    for root in roots {
        generator
            .add(root)
            .with_context(|| format!("generating schema for `{root}`"))?;
    }
    let documents = generator.finish()?;

    let mut written = 0;
    for (type_name, document) in &documents {
        let id = document
            .get("$id")
            .and_then(Value::as_str)
            .ok_or_else(|| anyhow!("document for `{type_name}` has no $id"))?;
        let path = out.join(id);
        fs::write(&path, render(document)?)
            .with_context(|| format!("writing {}", path.display()))?;
        println!("  {} {}", "→".cyan(), path.display());
        written += 1;
    }
    Ok(written)
}

fn cmd_types(descriptor: &Path, nested: bool) -> Result<()> {
    let pool = load_pool(descriptor)?;
    if nested {
        for message in pool.messages() {
            if !message.map_entry {
                println!("{}", message.full_name);
            }
        }
    } else {
        for name in pool.top_level_messages() {
            println!("{name}");
        }
    }
    Ok(())
}

fn load_pool(descriptor: &Path) -> Result<DescriptorPool> {
    let text = fs::read_to_string(descriptor)
        .with_context(|| format!("reading {}", descriptor.display()))?;
    DescriptorPool::from_json_str(&text)
        .with_context(|| format!("parsing descriptor set {}", descriptor.display()))
}

/// Two-space-indented UTF-8 JSON with a single trailing newline, the form
/// the downstream golden-file tooling expects.
fn render(document: &Value) -> Result<String> {
    let mut text = serde_json::to_string_pretty(document)?;
    text.push('\n');
    Ok(text)
}
