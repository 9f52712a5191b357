mod kinds;

use anyhow::Context;
use clap::{Parser, Subcommand};
use glam::Vec3;
use kinds::{FieldLabels, Frame, Model};
use tessera_res::{Atom, Project, PropTracker, Property, ResError, TreeTracker};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "tessera-cli", about = "CLI tool for tessera asset sessions")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print version and crate info
    Info,
    /// Create, edit, undo and redo a frame, printing state after each step
    Demo {
        /// Number of vertices in the demo frame
        #[arg(short = 'n', long, default_value = "4")]
        vertices: usize,
    },
    /// Build a sample session and print its undo/redo history
    History {
        /// Print the history as JSON
        #[arg(long)]
        json: bool,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    match cli.command {
        Commands::Info => {
            println!("tessera-cli v{}", env!("CARGO_PKG_VERSION"));
            println!("transact: {}", tessera_transact::crate_info());
            println!("res: {}", tessera_res::crate_info());
        }
        Commands::Demo { vertices } => demo(vertices)?,
        Commands::History { json } => {
            let project = sample_session()?;
            let history = project.nexus().history();
            if json {
                println!("{}", serde_json::to_string_pretty(&history)?);
            } else {
                println!("{}", project.nexus().undo_label());
                for desc in &history.undo {
                    println!("  undo: {desc}");
                }
                println!("{}", project.nexus().redo_label());
                for desc in &history.redo {
                    println!("  redo: {desc}");
                }
            }
        }
    }

    Ok(())
}

fn demo(vertices: usize) -> anyhow::Result<()> {
    let project = Project::new();
    let name = Atom::parse("/frames/rest")?;
    let tree = TreeTracker::<Frame>::new(&project);
    let _acquired = tree
        .on_acquire()
        .subscribe(|frame| info!(name = %frame.get_name(), "frame appeared"));
    let _lost = tree
        .on_lose()
        .subscribe(|frame| info!(id = %frame.asset().id(), "frame went away"));
    tree.set_base(Atom::parse("/frames")?);

    let frame = project.run(|ts| {
        ts.describe("Create frame");
        project.create(ts, name.clone(), Frame::row(vertices))
    })?;
    report(&project, "created");
    let mut fields = FieldLabels::default();
    frame.reflect(&mut fields);
    println!("  fields: {}", fields.0.join(", "));

    project.run(|ts| {
        ts.describe("Move vertex");
        frame.nudge(ts, 0, Vec3::new(0.0, 5.0, 0.0));
        Ok::<_, ResError>(())
    })?;
    report(&project, "moved");
    println!("  centroid: {}", frame.centroid());

    project.undo()?;
    report(&project, "undo");
    println!("  centroid: {}", frame.centroid());

    project.undo()?;
    report(&project, "undo");

    project.redo()?;
    project.redo()?;
    report(&project, "redo x2");
    println!("  centroid: {}", frame.centroid());
    Ok(())
}

/// Frame edits, a model pointing at the frame, and one undone step.
fn sample_session() -> anyhow::Result<Project> {
    let project = Project::new();
    let rest = Atom::parse("/frames/rest")?;
    let posed = Atom::parse("/frames/posed")?;

    let (frame, model) = project.run(|ts| {
        ts.describe("Create model");
        let frame = project.create(ts, rest.clone(), Frame::row(3))?;
        let model = project.create(
            ts,
            Atom::parse("/models/box")?,
            Model {
                frame: Property::new(frame.to_ref()),
            },
        )?;
        Ok::<_, ResError>((frame, model))
    })?;

    let shown = PropTracker::<Frame>::new(&project);
    shown.bind(&model.frame);

    project.run(|ts| {
        ts.describe("Move vertex");
        frame.nudge(ts, 2, Vec3::Z);
        Ok::<_, ResError>(())
    })?;
    project.run(|ts| {
        ts.describe("Create posed frame");
        let posed = project.create(ts, posed.clone(), Frame::row(3))?;
        model.frame.set(ts, posed.to_ref());
        Ok::<_, ResError>(())
    })?;
    info!(shown = %shown.get_name(), "model frame");
    project.undo()?;
    info!(shown = %shown.get_name(), "model frame after undo");

    shown.get().context("model lost its frame")?;
    Ok(project)
}

fn report(project: &Project, step: &str) {
    let names: Vec<String> = project
        .get_asset_names()
        .iter()
        .map(ToString::to_string)
        .collect();
    println!(
        "{step}: assets=[{}] undo={} redo={}",
        names.join(", "),
        project.nexus().undo_depth(),
        project.nexus().redo_depth()
    );
}
