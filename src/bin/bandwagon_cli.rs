use bandwagon::{
    about,
    band::format_dna_size,
    compare::{bands_patterns_are_similar, merge_bands_in_pattern},
    config::Settings,
    digestion::{DigestionMatrix, GroupBy, annotate_digestion_bands},
    dna_sequence::{DNAsequence, TopologyHint, load_records},
    enzymes::EnzymeCatalog,
    ladder::{DEFAULT_LADDER_NAME, LadderBand},
};
use bandwagon_engine::{DigestionEngine, Topology};
use log::debug;
use serde::Serialize;
use std::{env, fs};

#[derive(Serialize)]
struct EnzymeSummary {
    name: String,
    sequence: String,
    cut: isize,
    overlap: isize,
    palindromic: bool,
}

#[derive(Serialize)]
struct DigestionSummary {
    record: String,
    length: usize,
    topology: Topology,
    enzymes: Vec<String>,
    cut_sites: Vec<usize>,
    bands: Vec<usize>,
    band_labels: Vec<String>,
}

#[derive(Serialize)]
struct ComparisonSummary {
    similar: bool,
    tolerance: f64,
    merge_tolerance: f64,
    merged_1: Vec<f64>,
    merged_2: Vec<f64>,
}

#[derive(Serialize)]
struct LadderSummary {
    ladder: String,
    size_range: (f64, f64),
    bands: Vec<LadderBand>,
    migrations: Vec<LadderBand>,
    ticks: Vec<usize>,
}

fn usage() {
    eprintln!(
        "Usage:\n  \
  bandwagon_cli --version\n  \
  bandwagon_cli [--config PATH] enzymes\n  \
  bandwagon_cli [--config PATH] bands SEQUENCE ENZ[,ENZ...] [linear|circular]\n  \
  bandwagon_cli [--config PATH] digest FILE ENZ[,ENZ...] [auto|linear|circular]\n  \
  bandwagon_cli [--config PATH] annotate FILE ENZ[,ENZ...] [auto|linear|circular]\n  \
  bandwagon_cli [--config PATH] matrix [--group-by digestions|records] \
  'ENZ,ENZ;ENZ' FILE [FILE...]\n  \
  bandwagon_cli [--config PATH] compare SIZE,SIZE... SIZE,SIZE...\n  \
  bandwagon_cli [--config PATH] ladder [NAME] [SIZE...]\n\n  \
  Tip: pass @file.txt instead of an inline SEQUENCE"
    );
}

fn print_json<T: Serialize>(value: &T) -> Result<(), String> {
    let text = serde_json::to_string_pretty(value)
        .map_err(|e| format!("Could not serialize JSON output: {e}"))?;
    println!("{text}");
    Ok(())
}

fn parse_global_config_arg(args: &[String]) -> (Option<String>, usize) {
    if args.len() >= 3 && args[1] == "--config" {
        return (Some(args[2].clone()), 3);
    }
    (None, 1)
}

fn load_sequence_arg(value: &str) -> Result<String, String> {
    if let Some(path) = value.strip_prefix('@') {
        fs::read_to_string(path).map_err(|e| format!("Could not read sequence file '{path}': {e}"))
    } else {
        Ok(value.to_string())
    }
}

fn parse_enzymes(text: &str) -> Vec<String> {
    text.split(',')
        .map(|e| e.trim())
        .filter(|e| !e.is_empty())
        .map(|e| e.to_string())
        .collect()
}

fn parse_sizes(text: &str) -> Result<Vec<f64>, String> {
    text.split(',')
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse::<f64>()
                .map_err(|_| format!("Invalid band size '{s}'"))
        })
        .collect()
}

fn parse_topology_hint(args: &[String], idx: usize) -> Result<TopologyHint, String> {
    match args.get(idx) {
        None => Ok(TopologyHint::Auto),
        Some(text) => TopologyHint::parse(text)
            .ok_or_else(|| format!("Invalid topology '{text}', expected auto|linear|circular")),
    }
}

fn require_arg<'a>(args: &'a [String], idx: usize, what: &str) -> Result<&'a str, String> {
    match args.get(idx) {
        Some(arg) => Ok(arg),
        None => {
            usage();
            Err(format!("Missing {what}"))
        }
    }
}

fn load_file_records(
    path: &str,
    hint: TopologyHint,
    settings: &Settings,
) -> Result<Vec<DNAsequence>, String> {
    let mut records = load_records(path, hint).map_err(|e| e.to_string())?;
    for record in records.iter_mut() {
        if !record.has_known_topology() {
            record.set_topology(settings.default_topology);
        }
    }
    Ok(records)
}

fn summarize_digestion(
    record: &DNAsequence,
    enzymes: &[String],
    engine: &DigestionEngine<EnzymeCatalog>,
) -> Result<DigestionSummary, String> {
    let topology = record.topology();
    let cut_sites = engine
        .merged_cut_sites(record.forward(), enzymes, topology)
        .map_err(|e| e.to_string())?;
    let bands = engine
        .compute_digestion_bands(record.forward(), enzymes, topology)
        .map_err(|e| e.to_string())?;
    Ok(DigestionSummary {
        record: record.name().clone().unwrap_or_default(),
        length: record.len(),
        topology,
        enzymes: enzymes.to_vec(),
        cut_sites,
        band_labels: bands.iter().map(|b| format_dna_size(*b)).collect(),
        bands,
    })
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    if let Err(e) = run() {
        eprintln!("{e}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), String> {
    let args: Vec<String> = env::args().collect();
    if args.len() <= 1 {
        usage();
        return Err("Missing command".to_string());
    }
    if args.iter().any(|a| a == "--version" || a == "-V") {
        println!("{}", about::version_cli_text());
        return Ok(());
    }

    let (config_path, cmd_idx) = parse_global_config_arg(&args);
    if args.len() <= cmd_idx {
        usage();
        return Err("Missing command".to_string());
    }
    let settings = Settings::discover(config_path.as_deref()).map_err(|e| format!("{e:#}"))?;
    debug!("Settings: {settings:?}");

    let command = &args[cmd_idx];
    match command.as_str() {
        "enzymes" => {
            let catalog = settings.enzyme_catalog().map_err(|e| format!("{e:#}"))?;
            let enzymes = catalog
                .restriction_enzymes()
                .iter()
                .map(|re| EnzymeSummary {
                    name: re.name.clone(),
                    sequence: re.sequence.clone(),
                    cut: re.cut,
                    overlap: re.overlap,
                    palindromic: re.is_palindromic(),
                })
                .collect::<Vec<_>>();
            print_json(&enzymes)
        }
        "bands" => {
            let sequence = load_sequence_arg(require_arg(&args, cmd_idx + 1, "SEQUENCE")?)?;
            let enzymes = parse_enzymes(require_arg(&args, cmd_idx + 2, "enzyme list")?);
            let topology = match args.get(cmd_idx + 3) {
                Some(text) => Topology::parse(text).map_err(|e| e.to_string())?,
                None => settings.default_topology,
            };
            let mut record = DNAsequence::from_sequence(&sequence).map_err(|e| e.to_string())?;
            record.set_topology(topology);
            let engine = settings.digestion_engine(
                settings.enzyme_catalog().map_err(|e| format!("{e:#}"))?,
            );
            print_json(&summarize_digestion(&record, &enzymes, &engine)?)
        }
        "digest" => {
            let path = require_arg(&args, cmd_idx + 1, "FILE")?;
            let enzymes = parse_enzymes(require_arg(&args, cmd_idx + 2, "enzyme list")?);
            let hint = parse_topology_hint(&args, cmd_idx + 3)?;
            let records = load_file_records(path, hint, &settings)?;
            let engine = settings.digestion_engine(
                settings.enzyme_catalog().map_err(|e| format!("{e:#}"))?,
            );
            let summaries = records
                .iter()
                .map(|record| summarize_digestion(record, &enzymes, &engine))
                .collect::<Result<Vec<_>, _>>()?;
            print_json(&summaries)
        }
        "annotate" => {
            let path = require_arg(&args, cmd_idx + 1, "FILE")?;
            let enzymes = parse_enzymes(require_arg(&args, cmd_idx + 2, "enzyme list")?);
            let hint = parse_topology_hint(&args, cmd_idx + 3)?;
            let record = load_records(path, hint)
                .map_err(|e| e.to_string())?
                .into_iter()
                .next()
                .ok_or_else(|| format!("No sequence record in '{path}'"))?;
            let engine = settings.digestion_engine(
                settings.enzyme_catalog().map_err(|e| format!("{e:#}"))?,
            );
            let bands =
                annotate_digestion_bands(&record, &enzymes, &engine).map_err(|e| e.to_string())?;
            print_json(&bands)
        }
        "matrix" => {
            let mut idx = cmd_idx + 1;
            let mut group_by = GroupBy::default();
            if args.get(idx).map(|a| a.as_str()) == Some("--group-by") {
                let text = require_arg(&args, idx + 1, "grouping")?;
                group_by = GroupBy::parse(text).ok_or_else(|| {
                    format!("Invalid grouping '{text}', expected digestions|records")
                })?;
                idx += 2;
            }
            let digestions = require_arg(&args, idx, "digestions")?
                .split(';')
                .map(parse_enzymes)
                .collect::<Vec<_>>();
            let paths = &args[(idx + 1).min(args.len())..];
            if paths.is_empty() {
                usage();
                return Err("Missing FILE".to_string());
            }
            let mut records = vec![];
            for path in paths {
                records.extend(load_file_records(path, TopologyHint::Auto, &settings)?);
            }
            let engine = settings.digestion_engine(
                settings.enzyme_catalog().map_err(|e| format!("{e:#}"))?,
            );
            let matrix = DigestionMatrix::compute(&records, &digestions, &engine, group_by)
                .map_err(|e| e.to_string())?;
            print_json(&matrix)
        }
        "compare" => {
            let sizes_1 = parse_sizes(require_arg(&args, cmd_idx + 1, "first pattern")?)?;
            let sizes_2 = parse_sizes(require_arg(&args, cmd_idx + 2, "second pattern")?)?;
            print_json(&ComparisonSummary {
                similar: bands_patterns_are_similar(
                    &sizes_1,
                    &sizes_2,
                    settings.similarity_tolerance,
                    settings.merge_tolerance,
                ),
                tolerance: settings.similarity_tolerance,
                merge_tolerance: settings.merge_tolerance,
                merged_1: merge_bands_in_pattern(&sizes_1, settings.merge_tolerance),
                merged_2: merge_bands_in_pattern(&sizes_2, settings.merge_tolerance),
            })
        }
        "ladder" => {
            let ladders = settings.ladder_catalog().map_err(|e| format!("{e:#}"))?;
            let mut rest = &args[cmd_idx + 1..];
            let name = match rest.first() {
                Some(first) if first.parse::<f64>().is_err() => {
                    rest = &rest[1..];
                    first.as_str()
                }
                _ => DEFAULT_LADDER_NAME,
            };
            let ladder = ladders.get(name).ok_or_else(|| {
                format!(
                    "Unknown ladder '{name}', known: {}",
                    ladders.names_sorted().join(", ")
                )
            })?;
            let sizes = rest
                .iter()
                .map(|s| parse_sizes(s))
                .collect::<Result<Vec<_>, _>>()?
                .concat();
            print_json(&LadderSummary {
                ladder: ladder.name().to_string(),
                size_range: ladder.size_span(),
                bands: ladder.bands().clone(),
                migrations: sizes
                    .iter()
                    .map(|size| LadderBand {
                        size: *size,
                        migration: ladder.dna_size_to_migration(*size),
                    })
                    .collect(),
                ticks: ladder.ticks(4),
            })
        }
        _ => {
            usage();
            Err(format!("Unknown command '{command}'"))
        }
    }
}
