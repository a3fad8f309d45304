// main.rs - CLI entry point

use cgtyper::cli::{Config, GenomeSource};
use cgtyper::prelude::*;
use std::time::Instant;

fn main() {
    if let Err(e) = run_main() {
        eprintln!("❌ ERROR: {}", e);
        std::process::exit(1);
    }
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .format_timestamp_secs()
        .init();
}

fn run_main() -> Result<()> {
    let mut args: Args = argh::from_env();
    let command_line = std::env::args().collect::<Vec<String>>().join(" ");

    // Handle generate config first
    if args.generate_config {
        let sample_config = Config::generate_sample();
        println!("{}", sample_config);
        println!("\n💡 Save this content to a .toml file and use --config /path/to/config.toml");
        return Ok(());
    }

    init_logging(args.verbose);

    // Load configuration file if specified
    if let Some(config_path) = args.config.clone() {
        args = args.with_config_file(&config_path)?;
    }

    if args.list_schemas {
        let schema_map = SchemaMap::builtin().with_overrides(args.schema_overrides.iter().cloned());
        println!("📚 {} taxon bindings", schema_map.len());
        for (schema, taxids) in schema_map.list_schemas() {
            let taxids: Vec<String> = taxids.iter().map(|t| t.to_string()).collect();
            println!("  - {}: {}", schema, taxids.join(", "));
        }
        return Ok(());
    }

    // Validate all arguments
    let validation = validate_args(&args)?;

    log::info!("🚀 cgtyper v{}", env!("CARGO_PKG_VERSION"));
    if args.dry_run {
        log::info!("🧪 Dry run: external tools will not be executed");
    }
    let total_start = Instant::now();

    let mut genome = match &validation.source {
        GenomeSource::Container(path) => GenomeRecord::from_json_file(path)?,
        GenomeSource::Fasta {
            path,
            sample_id,
            taxid,
        } => GenomeRecord::from_fasta(path, sample_id, *taxid)?,
    };
    log::info!(
        "🧬 Genome '{}' (taxid {}, {} contigs)",
        genome.sample_id,
        genome.taxid,
        genome.contigs.len()
    );

    // Without a taxonomy file (dry run only) the taxid is its own lineage
    let taxonomy: Box<dyn TaxonomyService> = match &validation.taxonomy {
        Some(path) => Box::new(TaxonomyDb::from_file(path)?),
        None => Box::new(StaticTaxonomy::new().with_lineage(genome.taxid, vec![genome.taxid])),
    };

    let runner: Box<dyn ToolRunner> = if args.dry_run {
        Box::new(DryRunRunner)
    } else {
        Box::new(ProcessRunner::new(true))
    };

    let pipeline = Pipeline::new(&validation.pipeline, taxonomy.as_ref(), runner.as_ref());
    let outcome = pipeline.run(&mut genome)?;

    match &outcome {
        PipelineOutcome::NoSchema => {
            log::info!("ℹ️  Genome written unchanged (no schema)");
        }
        PipelineOutcome::Typed(record) => {
            log::info!(
                "✅ {}: {}/{} loci called ({:.2}%), QC {}",
                record.schema_name,
                record.loci_called,
                record.loci_total,
                record.pct_called,
                record.qc_verdict
            );
            match &record.cluster_levels {
                Some(levels) => log::info!("🌳 Cluster levels: {}", levels),
                None => log::info!("🌳 Not clustered"),
            }
        }
    }

    write_genome(&genome, &validation.output)?;
    if let Some(summary) = &validation.summary {
        write_summary(
            summary,
            &genome,
            &outcome,
            &validation.pipeline.cluster.levels,
            &command_line,
        )?;
    }

    log::info!("⏱️  Total time: {:.2}s", total_start.elapsed().as_secs_f64());
    Ok(())
}
