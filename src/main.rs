//! Curriculum graph exporter.
//!
//! Small driver around the library: fetch the structure dataset from a
//! running curriculum API, optionally filter it, settle the layout, and
//! write an SVG snapshot.
//!
//! Usage:
//!   curriculum-graph [BASE_URL] [--standard CODE] [--grade GRADE] [--mini] [--out FILE]

use curriculum_graph::{
    pipeline::GraphDataPipeline, render::SvgRenderer, simulation, CurriculumApi, GraphFilter,
    DEFAULT_BASE_URL,
};

// ============================================================================
// Main
// ============================================================================

struct Args {
    base_url: String,
    filter: GraphFilter,
    mini: bool,
    out: String,
}

fn parse_args() -> Args {
    let mut args = Args {
        base_url: DEFAULT_BASE_URL.to_string(),
        filter: GraphFilter::default(),
        mini: false,
        out: "curriculum-graph.svg".to_string(),
    };

    let mut iter = std::env::args().skip(1);
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--standard" => args.filter.standard_code = iter.next(),
            "--grade" => args.filter.grade = iter.next(),
            "--mini" => args.mini = true,
            "--out" => {
                if let Some(path) = iter.next() {
                    args.out = path;
                }
            }
            "--help" | "-h" => {
                println!(
                    "Usage: curriculum-graph [BASE_URL] [--standard CODE] [--grade GRADE] [--mini] [--out FILE]"
                );
                std::process::exit(0);
            }
            other => args.base_url = other.to_string(),
        }
    }
    args
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args = parse_args();

    let api = CurriculumApi::new(&args.base_url).expect("Invalid base URL");
    println!("Fetching structure from {}", args.base_url);

    let payload = match api.structure(true).await {
        Ok(payload) => payload,
        Err(e) => {
            eprintln!("Error loading structure: {}", e);
            std::process::exit(1);
        }
    };

    let renderer = SvgRenderer::new(simulation::DEFAULT_WIDTH, simulation::DEFAULT_HEIGHT);
    let mut pipeline = if args.mini {
        GraphDataPipeline::mini(renderer)
    } else {
        GraphDataPipeline::new(renderer)
    };

    if let Err(e) = pipeline.load_dataset(payload) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    if !args.filter.is_empty() {
        pipeline.apply_filter(args.filter.clone());
    }

    // Run the layout to rest before taking the snapshot.
    while pipeline.tick() {}

    let stats = pipeline.stats();
    println!(
        "Rendered {} of {} nodes, {} of {} links ({})",
        stats.rendered_nodes,
        stats.total_nodes,
        stats.rendered_links,
        stats.total_links,
        args.filter.describe()
    );

    let svg = pipeline.renderer().to_svg();
    if let Err(e) = std::fs::write(&args.out, svg) {
        eprintln!("Error writing {}: {}", args.out, e);
        std::process::exit(1);
    }
    println!("Wrote {}", args.out);
}
