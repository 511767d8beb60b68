use std::error::Error;
use std::fs;
use std::path::PathBuf;
use regex::Regex;

/// Directory holding the sample configurations, traces and expected outputs
pub const SAMPLES_PATH: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/samples");

pub struct TestCasePaths {
    pub config: PathBuf,
    pub trace: PathBuf,
    pub output: PathBuf,
}

/// Finds every sample with an expected output
///
/// Expected outputs are named `output-<trace>-<config>.json`, and refer to `traces/<trace>.txt`
/// and `configs/<config>.json`
pub fn get_configs() -> Result<Vec<TestCasePaths>, Box<dyn Error>> {
    let samples = PathBuf::from(SAMPLES_PATH);
    let output_pattern = Regex::new(r"^output-(?P<trace>[0-9a-zA-Z_]+)-(?P<config>[0-9a-zA-Z_]+)\.json$")?;
    let mut files = Vec::new();
    for entry in fs::read_dir(samples.join("outputs"))? {
        let file_name = entry?
            .file_name()
            .into_string()
            .map_err(|e| format!("Can't convert OS string ({e:?}) to standard string"))?;
        if output_pattern.is_match(&file_name) {
            files.push(file_name);
        }
    }
    files.sort();
    let mut out = Vec::new();
    for file_name in files {
        // Get components of name
        let tokens = output_pattern.captures(&file_name).ok_or("Couldn't parse the file name".to_string())?;
        let trace = tokens.name("trace").ok_or("Couldn't get the trace file from the output file name".to_string())?.as_str();
        let config = tokens.name("config").ok_or("Couldn't get the config file from the output file name".to_string())?.as_str();
        out.push(TestCasePaths {
            config: samples.join("configs").join(format!("{config}.json")),
            trace: samples.join("traces").join(format!("{trace}.txt")),
            output: samples.join("outputs").join(&file_name),
        })
    }
    Ok(out)
}
