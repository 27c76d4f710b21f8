//! Persistence: flat binary records for brains and agents, plus the JSON
//! seed manifest used to bootstrap a population from trained agents.
//!
//! The brain record is a little-endian flat stream:
//! `provenance:i32`, `input:i32`, `hidden:i32`, `output:i32`, then `hidden`
//! doubles (B1), `input*hidden` doubles (W1, row-major), `output` doubles
//! (B2), and `hidden*output` doubles (W2, row-major). An agent record
//! prefixes that with two tagged, length-prefixed strings (`"name"`, then
//! the name; `"species"`, then the species). Strings are UTF-8 with a
//! little-endian `u32` byte-length prefix.

use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

use ndarray::{Array1, Array2};
use rand::Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

use super::agent::Agent;
use super::brain::{Brain, BreedingMode, Provenance};

/// A persisted record failed its structure checks or could not be read.
#[derive(Debug, Error)]
pub enum RecordError {
    /// Underlying I/O failure.
    #[error("i/o failure: {0}")]
    Io(#[from] std::io::Error),
    /// A tag string did not match the expected literal.
    #[error("expected tag {expected:?}, found {found:?}")]
    BadTag {
        /// The tag the format requires at this position.
        expected: &'static str,
        /// What the record actually contained.
        found: String,
    },
    /// The provenance code is not a known variant.
    #[error("unknown provenance code {0}")]
    BadProvenance(i32),
    /// A brain dimension was zero or negative.
    #[error("non-positive brain dimension {0}")]
    BadDimension(i32),
    /// A string field was not valid UTF-8.
    #[error("string field is not valid utf-8")]
    BadString(#[from] std::string::FromUtf8Error),
    /// The seed manifest JSON could not be parsed.
    #[error("manifest parse failure: {0}")]
    Manifest(#[from] serde_json::Error),
    /// Attempted to persist an agent that has no brain yet.
    #[error("agent has no brain to persist")]
    Uninitialized,
}

/// Writes a brain record to a stream.
pub fn write_brain<W: Write>(brain: &Brain, writer: &mut W) -> Result<(), RecordError> {
    write_i32(writer, brain.provenance.code())?;
    write_i32(writer, brain.input_size as i32)?;
    write_i32(writer, brain.hidden_size as i32)?;
    write_i32(writer, brain.output_size as i32)?;

    for &value in &brain.b1 {
        write_f64(writer, value)?;
    }
    for &value in &brain.w1 {
        write_f64(writer, value)?;
    }
    for &value in &brain.b2 {
        write_f64(writer, value)?;
    }
    for &value in &brain.w2 {
        write_f64(writer, value)?;
    }
    Ok(())
}

/// Reads a brain record from a stream.
pub fn read_brain<R: Read>(reader: &mut R) -> Result<Brain, RecordError> {
    let provenance_code = read_i32(reader)?;
    let provenance = Provenance::from_code(provenance_code)
        .ok_or(RecordError::BadProvenance(provenance_code))?;

    let input_size = read_dimension(reader)?;
    let hidden_size = read_dimension(reader)?;
    let output_size = read_dimension(reader)?;

    let b1 = read_f64_array(reader, hidden_size)?;
    let w1 = read_f64_array(reader, input_size * hidden_size)?;
    let b2 = read_f64_array(reader, output_size)?;
    let w2 = read_f64_array(reader, hidden_size * output_size)?;

    Ok(Brain::from_parts(
        provenance,
        Array2::from_shape_vec((input_size, hidden_size), w1)
            .expect("element count matches shape"),
        Array1::from_vec(b1),
        Array2::from_shape_vec((hidden_size, output_size), w2)
            .expect("element count matches shape"),
        Array1::from_vec(b2),
    ))
}

/// Writes an agent record (tagged name and species, then the brain).
pub fn write_agent<W: Write>(agent: &Agent, writer: &mut W) -> Result<(), RecordError> {
    let brain = agent.brain().ok_or(RecordError::Uninitialized)?;

    write_str(writer, "name")?;
    write_str(writer, &agent.name)?;
    write_str(writer, "species")?;
    write_str(writer, &agent.species)?;
    write_brain(brain, writer)
}

/// Reads an agent record. The reconstructed agent is already initialized,
/// so a subsequent `initialize` call is a no-op.
pub fn read_agent<R: Read>(reader: &mut R) -> Result<Agent, RecordError> {
    expect_tag(reader, "name")?;
    let name = read_str(reader)?;
    expect_tag(reader, "species")?;
    let species = read_str(reader)?;
    let brain = read_brain(reader)?;

    Ok(Agent::from_parts(name, species, brain))
}

/// Writes an agent record to a file.
pub fn save_agent(agent: &Agent, path: &Path) -> Result<(), RecordError> {
    let mut writer = BufWriter::new(File::create(path)?);
    write_agent(agent, &mut writer)?;
    writer.flush()?;
    Ok(())
}

/// Reads an agent record from a file.
pub fn load_agent(path: &Path) -> Result<Agent, RecordError> {
    let mut reader = BufReader::new(File::open(path)?);
    read_agent(&mut reader)
}

/// One entry of the seed manifest: a persisted agent record plus the
/// display identity to give it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct SeedEntry {
    /// Path to the agent's binary record.
    pub data_file: PathBuf,
    /// Display name to assign the loaded agent.
    pub player_name: String,
    /// Species tag to assign the loaded agent.
    pub species: String,
}

/// Composition knobs for seeding a population from a manifest.
#[derive(Debug, Clone)]
pub struct SeedOptions {
    /// Mutated clones spawned per founder.
    pub clones_per_seed: usize,
    /// Mix-crossover offspring per ordered pair of distinct founders.
    pub offspring_per_pair: usize,
    /// Brand-new randomly seeded agents appended at the end.
    pub fresh_agents: usize,
    /// Mutation rate applied to each spawned clone.
    pub mutation_rate: f64,
}

impl Default for SeedOptions {
    fn default() -> Self {
        Self {
            clones_per_seed: 9,
            offspring_per_pair: 5,
            fresh_agents: 20,
            mutation_rate: 0.40,
        }
    }
}

/// Loads a seed manifest and composes a starting population from it:
/// every founder, its mutated clones, crossover offspring for each ordered
/// founder pair, and a tail of fresh agents.
///
/// A founder pair with mismatched brain topology is skipped with a warning
/// rather than failing the whole load.
pub fn load_seed_population<R: Rng>(
    manifest_path: &Path,
    options: &SeedOptions,
    rng: &mut R,
) -> Result<Vec<Agent>, RecordError> {
    let manifest = File::open(manifest_path)?;
    let entries: Vec<SeedEntry> = serde_json::from_reader(BufReader::new(manifest))?;

    let mut founders = Vec::with_capacity(entries.len());
    for entry in entries {
        let mut founder = load_agent(&entry.data_file)?;
        founder.name = entry.player_name;
        founder.species = entry.species;
        founders.push(founder);
    }

    let mut population = Vec::new();
    for founder in &founders {
        population.push(founder.clone());
        for _ in 0..options.clones_per_seed {
            let mut child = founder.spawn_clone(rng);
            child.mutate(options.mutation_rate, rng);
            population.push(child);
        }
    }

    for (left_index, left) in founders.iter().enumerate() {
        for (right_index, right) in founders.iter().enumerate() {
            if left_index == right_index {
                continue;
            }
            for _ in 0..options.offspring_per_pair {
                match left.breed_with(right, BreedingMode::Mix, rng) {
                    Ok(child) => population.push(child),
                    Err(err) => {
                        warn!(%err, left = %left.name, right = %right.name,
                            "skipping incompatible founder pair");
                        break;
                    }
                }
            }
        }
    }

    for _ in 0..options.fresh_agents {
        let mut agent = Agent::new(rng);
        agent.initialize(rng);
        population.push(agent);
    }

    Ok(population)
}

fn write_i32<W: Write>(writer: &mut W, value: i32) -> std::io::Result<()> {
    writer.write_all(&value.to_le_bytes())
}

fn write_f64<W: Write>(writer: &mut W, value: f64) -> std::io::Result<()> {
    writer.write_all(&value.to_le_bytes())
}

fn write_str<W: Write>(writer: &mut W, value: &str) -> std::io::Result<()> {
    writer.write_all(&(value.len() as u32).to_le_bytes())?;
    writer.write_all(value.as_bytes())
}

fn read_i32<R: Read>(reader: &mut R) -> std::io::Result<i32> {
    let mut buffer = [0u8; 4];
    reader.read_exact(&mut buffer)?;
    Ok(i32::from_le_bytes(buffer))
}

fn read_f64<R: Read>(reader: &mut R) -> std::io::Result<f64> {
    let mut buffer = [0u8; 8];
    reader.read_exact(&mut buffer)?;
    Ok(f64::from_le_bytes(buffer))
}

fn read_str<R: Read>(reader: &mut R) -> Result<String, RecordError> {
    let mut buffer = [0u8; 4];
    reader.read_exact(&mut buffer)?;
    let length = u32::from_le_bytes(buffer) as usize;

    let mut bytes = vec![0u8; length];
    reader.read_exact(&mut bytes)?;
    Ok(String::from_utf8(bytes)?)
}

fn expect_tag<R: Read>(reader: &mut R, expected: &'static str) -> Result<(), RecordError> {
    let found = read_str(reader)?;
    if found != expected {
        return Err(RecordError::BadTag { expected, found });
    }
    Ok(())
}

fn read_dimension<R: Read>(reader: &mut R) -> Result<usize, RecordError> {
    let value = read_i32(reader)?;
    if value <= 0 {
        return Err(RecordError::BadDimension(value));
    }
    Ok(value as usize)
}

fn read_f64_array<R: Read>(reader: &mut R, count: usize) -> Result<Vec<f64>, RecordError> {
    let mut values = Vec::with_capacity(count);
    for _ in 0..count {
        values.push(read_f64(reader)?);
    }
    Ok(values)
}
