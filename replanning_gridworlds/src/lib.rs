//! Helpers for producing and storing the gridworlds the replanning agents are evaluated on.
//!
//! Gridworlds are exchanged as rows of `bool` where `true` marks a blocked cell, indexed as
//! `rows[row][col]`.
use csv::{ReaderBuilder, WriterBuilder};
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Probability with which a newly visited cell is turned into an obstacle during generation.
pub const DEFAULT_BLOCK_PROBABILITY: f64 = 0.3;

const FREE_TILE: u8 = b'.';
const BLOCKED_TILE: u8 = b'@';

/// One line of the results table written by batch evaluations.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RunRecord {
    pub world: usize,
    pub algorithm: String,
    pub grid_size: usize,
    pub success: bool,
    pub trace_len: usize,
    pub searches: usize,
    pub expanded: usize,
    pub backtracks: usize,
    pub runtime_secs: f64,
}

fn unvisited_neighbours(visited: &[Vec<bool>], (x, y): (usize, usize)) -> Vec<(usize, usize)> {
    let n = visited.len();
    let mut neighbours = Vec::with_capacity(4);
    if x > 0 && !visited[x - 1][y] {
        neighbours.push((x - 1, y));
    }
    if x + 1 < n && !visited[x + 1][y] {
        neighbours.push((x + 1, y));
    }
    if y > 0 && !visited[x][y - 1] {
        neighbours.push((x, y - 1));
    }
    if y + 1 < n && !visited[x][y + 1] {
        neighbours.push((x, y + 1));
    }
    neighbours
}

/// Randomised depth-first traversal starting at `origin`. Every cell reached for the first time
/// becomes blocked with the given probability; only free cells are expanded further.
fn carve<R: Rng>(
    origin: (usize, usize),
    block_probability: f64,
    blocked: &mut [Vec<bool>],
    visited: &mut [Vec<bool>],
    rng: &mut R,
) {
    let mut stack = vec![origin];
    visited[origin.0][origin.1] = true;
    blocked[origin.0][origin.1] = false;
    while let Some(&top) = stack.last() {
        match unvisited_neighbours(visited, top).choose(rng) {
            Some(&(x, y)) => {
                visited[x][y] = true;
                if rng.gen_bool(block_probability) {
                    blocked[x][y] = true;
                } else {
                    stack.push((x, y));
                }
            }
            None => {
                stack.pop();
            }
        }
    }
}

/// Generates an `n` by `n` maze-like gridworld. The traversal starts at a random cell and is
/// restarted from every cell it did not reach. The corners `(0, 0)` and `(n - 1, n - 1)`, used as
/// start and goal by the drivers, are always free.
///
/// Fails with [io::ErrorKind::InvalidInput] if `block_probability` is not within `[0, 1]`.
pub fn generate_gridworld<R: Rng>(
    n: usize,
    block_probability: f64,
    rng: &mut R,
) -> io::Result<Vec<Vec<bool>>> {
    if !(0.0..=1.0).contains(&block_probability) {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("block probability {block_probability} is not within [0, 1]"),
        ));
    }
    let mut blocked = vec![vec![false; n]; n];
    if n == 0 {
        return Ok(blocked);
    }
    let mut visited = vec![vec![false; n]; n];
    let origin = (rng.gen_range(0..n), rng.gen_range(0..n));
    carve(origin, block_probability, &mut blocked, &mut visited, rng);
    for x in 0..n {
        for y in 0..n {
            if !visited[x][y] {
                carve((x, y), block_probability, &mut blocked, &mut visited, rng);
            }
        }
    }
    blocked[0][0] = false;
    blocked[n - 1][n - 1] = false;
    Ok(blocked)
}

/// Writes a gridworld in the Moving AI `.map` text format.
pub fn save_gridworld(path: &Path, rows: &[Vec<bool>]) -> io::Result<()> {
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir)?;
    }
    let mut w = BufWriter::new(File::create(path)?);
    let width = rows.first().map_or(0, Vec::len);
    writeln!(w, "type octile")?;
    writeln!(w, "height {}", rows.len())?;
    writeln!(w, "width {}", width)?;
    writeln!(w, "map")?;
    for row in rows {
        let line: Vec<u8> = row
            .iter()
            .map(|&b| if b { BLOCKED_TILE } else { FREE_TILE })
            .collect();
        w.write_all(&line)?;
        writeln!(w)?;
    }
    w.flush()
}

fn invalid_data(message: String) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidData, message)
}

fn parse_header(line: Option<&str>, key: &str) -> io::Result<usize> {
    let line = line.ok_or_else(|| invalid_data(format!("missing `{key}` header")))?;
    match line.split_once(' ') {
        Some((k, value)) if k == key => value
            .trim()
            .parse::<usize>()
            .map_err(|e| invalid_data(format!("bad `{key}` value {value:?}: {e}"))),
        _ => Err(invalid_data(format!("expected `{key}` header, found {line:?}"))),
    }
}

/// Reads a gridworld written by [save_gridworld]. Any tile other than `.`, `G` or `S` is
/// treated as blocked.
pub fn load_gridworld(path: &Path) -> io::Result<Vec<Vec<bool>>> {
    let map_str = fs::read_to_string(path)?;
    let mut lines = map_str.lines();
    lines.next();
    let h = parse_header(lines.next(), "height")?;
    let w = parse_header(lines.next(), "width")?;
    lines.next();

    let rows = lines
        .take(h)
        .map(|line| {
            let bytes = line.as_bytes();
            if bytes.len() != w {
                return Err(invalid_data(format!(
                    "row has {} tiles, expected {w}",
                    bytes.len()
                )));
            }
            Ok(bytes
                .iter()
                .map(|tile| ![FREE_TILE, b'G', b'S'].contains(tile))
                .collect::<Vec<bool>>())
        })
        .collect::<io::Result<Vec<_>>>()?;
    if rows.len() != h {
        return Err(invalid_data(format!("found {} rows, expected {h}", rows.len())));
    }
    Ok(rows)
}

/// Lists all `.map` files below `root`, sorted by path.
pub fn gridworld_paths(root: &Path) -> io::Result<Vec<PathBuf>> {
    let mut paths = Vec::new();
    for entry in WalkDir::new(root) {
        let entry = entry.map_err(io::Error::from)?;
        let path = entry.path();
        if entry.file_type().is_file() && path.extension().is_some_and(|ext| ext == "map") {
            paths.push(path.to_path_buf());
        }
    }
    paths.sort();
    Ok(paths)
}

pub fn write_records(path: &Path, records: &[RunRecord]) -> csv::Result<()> {
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir)?;
    }
    let mut writer = WriterBuilder::new().has_headers(true).from_path(path)?;
    for record in records {
        writer.serialize(record)?;
    }
    writer.flush()?;
    Ok(())
}

pub fn read_records(path: &Path) -> csv::Result<Vec<RunRecord>> {
    let mut reader = ReaderBuilder::new().has_headers(true).from_path(path)?;
    reader.deserialize().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn generated_corners_are_free() {
        let mut rng = StdRng::seed_from_u64(7);
        for n in [1, 2, 5, 21] {
            let rows = generate_gridworld(n, DEFAULT_BLOCK_PROBABILITY, &mut rng).unwrap();
            assert_eq!(rows.len(), n);
            assert!(rows.iter().all(|r| r.len() == n));
            assert!(!rows[0][0]);
            assert!(!rows[n - 1][n - 1]);
        }
    }

    #[test]
    fn generation_is_seeded() {
        let a = generate_gridworld(15, 0.3, &mut StdRng::seed_from_u64(3)).unwrap();
        let b = generate_gridworld(15, 0.3, &mut StdRng::seed_from_u64(3)).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn probability_outside_unit_interval_is_rejected() {
        let mut rng = StdRng::seed_from_u64(0);
        for p in [1.5, -0.1, f64::NAN] {
            let err = generate_gridworld(5, p, &mut rng).unwrap_err();
            assert_eq!(err.kind(), io::ErrorKind::InvalidInput);
        }
        let full = generate_gridworld(4, 1.0, &mut rng).unwrap();
        assert!(!full[0][0] && !full[3][3]);
    }

    #[test]
    fn zero_probability_gives_empty_world() {
        let rows = generate_gridworld(8, 0.0, &mut StdRng::seed_from_u64(1)).unwrap();
        assert!(rows.iter().flatten().all(|b| !b));
    }

    #[test]
    fn map_file_survives_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("worlds").join("gridworld_01.map");
        let rows = generate_gridworld(9, 0.3, &mut StdRng::seed_from_u64(11)).unwrap();
        save_gridworld(&path, &rows).unwrap();
        assert_eq!(load_gridworld(&path).unwrap(), rows);
        assert_eq!(gridworld_paths(dir.path()).unwrap(), vec![path]);
    }

    #[test]
    fn truncated_map_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.map");
        fs::write(&path, "type octile\nheight 3\nwidth 3\nmap\n...\n.@.\n").unwrap();
        let err = load_gridworld(&path).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
    }

    #[test]
    fn records_round_trip_through_csv() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("results.csv");
        let records = vec![RunRecord {
            world: 1,
            algorithm: "adaptive".to_owned(),
            grid_size: 101,
            success: true,
            trace_len: 230,
            searches: 12,
            expanded: 4031,
            backtracks: 0,
            runtime_secs: 0.25,
        }];
        write_records(&path, &records).unwrap();
        assert_eq!(read_records(&path).unwrap(), records);
    }
}
