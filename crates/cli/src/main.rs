use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use primgen::prelude::*;
use rand::{rngs::StdRng, SeedableRng};
use serde::Deserialize;
use serde_json::{json, Value};
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing_subscriber::fmt::SubscriberBuilder;

mod provenance;

use provenance::{write_sidecar, GeneratorEntry, RunRecord, RunTotals};

#[derive(Parser)]
#[command(name = "primgen")]
#[command(about = "Primary-particle generation runner")]
struct Cmd {
    /// Optional run tag; propagated to outputs and logs
    #[arg(long)]
    tag: Option<String>,

    #[command(subcommand)]
    action: Action,
}

#[derive(Subcommand)]
enum Action {
    /// Generate events and write them as JSON lines
    Run {
        /// Generator documents (JSON array or {"generators": [...]})
        #[arg(long)]
        generators: PathBuf,
        /// Volume store (JSON)
        #[arg(long)]
        geometry: PathBuf,
        #[arg(long, default_value_t = 10)]
        events: u64,
        #[arg(long, default_value_t = 0)]
        seed: u64,
        /// Labels to register but leave inactive
        #[arg(long = "inactive")]
        inactive: Vec<String>,
        #[arg(long)]
        out: PathBuf,
    },
    /// Print the normalized generator documents with derived quantities
    Describe {
        #[arg(long)]
        generators: PathBuf,
        #[arg(long)]
        geometry: PathBuf,
    },
    /// Print a small provenance JSON block
    Report,
}

fn main() -> Result<()> {
    SubscriberBuilder::default().with_target(false).init();
    let cmd = Cmd::parse();
    match cmd.action {
        Action::Run {
            generators,
            geometry,
            events,
            seed,
            inactive,
            out,
        } => {
            let opts = RunOpts {
                generators,
                geometry,
                events,
                seed,
                inactive,
                out,
                tag: cmd.tag,
            };
            run(&opts).map(|_| ())
        }
        Action::Describe {
            generators,
            geometry,
        } => describe(&generators, &geometry),
        Action::Report => report(cmd.tag),
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum GeneratorFile {
    List(Vec<Value>),
    Wrapped { generators: Vec<Value> },
}

fn read_json<T: for<'de> Deserialize<'de>>(path: &Path) -> Result<T> {
    let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
    serde_json::from_reader(BufReader::new(file))
        .with_context(|| format!("parsing {}", path.display()))
}

fn load(generators: &Path, geometry: &Path) -> Result<(GeneratorRegistry, VolumeStore)> {
    let geo: VolumeStore = read_json(geometry)?;
    let docs = match read_json::<GeneratorFile>(generators)? {
        GeneratorFile::List(docs) | GeneratorFile::Wrapped { generators: docs } => docs,
    };
    if docs.is_empty() {
        bail!("{} contains no generator documents", generators.display());
    }
    let mut reg = GeneratorRegistry::new(ModelRegistry::with_builtin());
    reg.register_all(&docs, &geo)
        .with_context(|| format!("configuring generators from {}", generators.display()))?;
    Ok((reg, geo))
}

struct RunOpts {
    generators: PathBuf,
    geometry: PathBuf,
    events: u64,
    seed: u64,
    inactive: Vec<String>,
    out: PathBuf,
    tag: Option<String>,
}

fn run(opts: &RunOpts) -> Result<RunTotals> {
    tracing::info!(
        generators = %opts.generators.display(),
        geometry = %opts.geometry.display(),
        events = opts.events,
        seed = opts.seed,
        tag = ?opts.tag,
        "run"
    );
    let (mut reg, geo) = load(&opts.generators, &opts.geometry)?;
    for label in &opts.inactive {
        reg.set_active(label, false)?;
    }

    if let Some(parent) = opts.out.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .with_context(|| format!("creating output dir {}", parent.display()))?;
        }
    }
    let file = File::create(&opts.out).with_context(|| format!("creating {}", opts.out.display()))?;
    let mut writer = BufWriter::new(file);

    let mut rng = StdRng::seed_from_u64(opts.seed);
    let mut sink = EventProvenance::new();
    let mut summary = RunTotals::default();
    for event_id in 0..opts.events {
        let vertices = reg.generate_primaries(EventRequest { event_id }, &mut rng, &geo, &mut sink)?;
        summary.events += 1;
        summary.vertices += vertices.len();
        summary.particles += sink.len();
        let line = json!({
            "event": event_id,
            "vertices": vertices,
            "provenance": sink.records,
        });
        serde_json::to_writer(&mut writer, &line)?;
        writer.write_all(b"\n")?;
    }
    writer.flush()?;
    tracing::info!(
        events = summary.events,
        vertices = summary.vertices,
        particles = summary.particles,
        out = %opts.out.display(),
        "run finished"
    );

    let generators = reg
        .labels()
        .into_iter()
        .map(|label| reg.is_active(label).unwrap_or(false))
        .zip(reg.describe())
        .map(|(active, doc)| GeneratorEntry::from_described(doc, active))
        .collect::<Result<Vec<_>>>()?;
    let record = RunRecord {
        code_rev: provenance::current_git_rev(),
        library_version: primgen::VERSION,
        tag: opts.tag.clone(),
        seed: opts.seed,
        geometry: opts.geometry.clone(),
        generators,
        totals: summary,
        output: opts.out.clone(),
    };
    write_sidecar(&record)?;
    Ok(summary)
}

fn describe(generators: &Path, geometry: &Path) -> Result<()> {
    let (reg, _) = load(generators, geometry)?;
    println!("{}", serde_json::to_string_pretty(&reg.describe())?);
    Ok(())
}

fn report(tag: Option<String>) -> Result<()> {
    let models = ModelRegistry::with_builtin();
    let obj = json!({
        "code_rev": provenance::current_git_rev(),
        "library_version": primgen::VERSION,
        "tag": tag,
        "generator_kinds": GeneratorKind::ALL.iter().map(|k| k.as_str()).collect::<Vec<_>>(),
        "models": models.names(),
    });
    println!("{}", serde_json::to_string_pretty(&obj)?);
    Ok(())
}
