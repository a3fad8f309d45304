// args.rs - Command line arguments definition

use argh::FromArgs;

#[derive(FromArgs)]
/// cgtyper - cgMLST typing and hierarchical cluster assignment
pub struct Args {
    /// genome container to type (JSON)
    #[argh(option)]
    pub genome: Option<String>,

    /// assembly FASTA used to build a new genome container (needs --taxid)
    #[argh(option)]
    pub fasta: Option<String>,

    /// taxon id of the genome built from --fasta
    #[argh(option)]
    pub taxid: Option<u32>,

    /// sample id of the genome built from --fasta (default: FASTA file stem)
    #[argh(option)]
    pub sample_id: Option<String>,

    /// output genome container (JSON, "-" for stdout, default: -)
    #[argh(option)]
    pub output: Option<String>,

    /// write a one-line TSV typing summary to this file
    #[argh(option)]
    pub summary: Option<String>,

    /// taxonomy nodes file (taxid, parent taxid, ...)
    #[argh(option)]
    pub taxonomy: Option<String>,

    /// typing backend root holding schemas/, clusters/ and refs/
    #[argh(option)]
    pub backend_root: Option<String>,

    /// date (YYYYMMDD) of the master profile table to use (default: latest)
    #[argh(option)]
    pub refs_date: Option<String>,

    /// minimum exact-match percentage for a good QC verdict (default: 70)
    #[argh(option, default = "70.0")]
    pub qc_threshold: f64,

    /// minimum exact-match percentage for clustering (default: 85)
    #[argh(option, default = "85.0")]
    pub cluster_threshold: f64,

    /// comma-separated HC levels kept on the record (default: 0,2,5,10,20,50,100)
    #[argh(option, default = "String::from(\"0,2,5,10,20,50,100\")")]
    pub hc_levels: String,

    /// number of CPUs passed to the allele caller (default: 1)
    #[argh(option, default = "1")]
    pub cpus: usize,

    /// allele caller executable (default: chewBBACA.py)
    #[argh(option, default = "String::from(\"chewBBACA.py\")")]
    pub allele_caller: String,

    /// clustering executable (default: pHierCC)
    #[argh(option, default = "String::from(\"pHierCC\")")]
    pub clusterer: String,

    /// parent directory for the per-run scratch directory (default: system temp)
    #[argh(option)]
    pub scratch_dir: Option<String>,

    /// keep the scratch directory after the run
    #[argh(switch)]
    pub keep_scratch: bool,

    /// print external commands and use placeholder results instead of running tools
    #[argh(switch)]
    pub dry_run: bool,

    /// path to TOML configuration file
    #[argh(option)]
    pub config: Option<String>,

    /// generate sample configuration file and exit
    #[argh(switch)]
    pub generate_config: bool,

    /// list the taxon → schema bindings and exit
    #[argh(switch)]
    pub list_schemas: bool,

    /// debug logging
    #[argh(switch, short = 'v')]
    pub verbose: bool,

    /// extra taxon → schema binding as TAXID=SCHEMA (repeatable)
    #[argh(option, long = "schema-override", from_str_fn(parse_schema_override))]
    pub schema_overrides: Vec<(u32, String)>,
}

/// Parse a `TAXID=SCHEMA` override
pub fn parse_schema_override(value: &str) -> Result<(u32, String), String> {
    let (taxid, schema) = value
        .split_once('=')
        .ok_or_else(|| format!("Expected TAXID=SCHEMA, got '{}'", value))?;
    let taxid = taxid
        .trim()
        .parse::<u32>()
        .map_err(|_| format!("Invalid taxid in schema override '{}'", value))?;
    let schema = schema.trim();
    if schema.is_empty() {
        return Err(format!("Empty schema name in override '{}'", value));
    }
    Ok((taxid, schema.to_string()))
}
