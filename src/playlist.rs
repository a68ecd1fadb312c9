//! Converts a block name into a finite ordered sequence of media URIs (§4.4).

use std::path::{Path, PathBuf};
use std::sync::{Mutex, OnceLock};

use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use url::Url;
use walkdir::WalkDir;

use crate::block::{BlockKind, Catalog};

pub const MAX_RECURSION_DEPTH: u32 = 16;

/// A finite ordered sequence of URI strings.
pub type Playlist = Vec<String>;

/// `!*'();:@&=+$,/?#[]%` plus the unreserved marks, left unescaped; every
/// other byte (including everything `NON_ALPHANUMERIC` already covers) is
/// percent-encoded.
const RESERVED_AND_UNRESERVED: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'!')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')')
    .remove(b';')
    .remove(b':')
    .remove(b'@')
    .remove(b'&')
    .remove(b'=')
    .remove(b'+')
    .remove(b'$')
    .remove(b',')
    .remove(b'/')
    .remove(b'?')
    .remove(b'#')
    .remove(b'[')
    .remove(b']')
    .remove(b'%')
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

fn process_rng() -> &'static Mutex<StdRng> {
    static RNG: OnceLock<Mutex<StdRng>> = OnceLock::new();
    RNG.get_or_init(|| Mutex::new(StdRng::from_os_rng()))
}

/// Recursively expands `block_name` into `acc`. Exceeding the recursion
/// bound logs and leaves `acc` unchanged.
pub fn expand(acc: &mut Playlist, block_name: &str, catalog: &Catalog, depth: u32) {
    if depth >= MAX_RECURSION_DEPTH {
        tracing::error!(%block_name, "maximum number of recursions reached");
        return;
    }
    let Some(record) = catalog.get(block_name) else {
        return;
    };
    match record.kind {
        BlockKind::File => expand_file(acc, &record.data),
        BlockKind::Playlist => expand_m3u(acc, &record.data),
        BlockKind::Random => expand_random(acc, &record.data),
        BlockKind::RandomFile => expand_random_file(acc, &record.data),
        BlockKind::Interleave => expand_interleave(acc, &record.data, catalog, depth),
    }
}

/// Escapes `data` as a URI if it already parses as one with a non-empty
/// scheme; otherwise, if it names an existing regular file, converts its
/// path to a `file://` URI; otherwise appends nothing.
fn expand_file(acc: &mut Playlist, data: &str) {
    if let Ok(url) = Url::parse(data)
        && !url.scheme().is_empty()
    {
        acc.push(utf8_percent_encode(data, RESERVED_AND_UNRESERVED).to_string());
        return;
    }
    let path = Path::new(data);
    if path.is_file()
        && let Some(uri) = file_uri(path)
    {
        acc.push(uri);
    }
}

fn file_uri(path: &Path) -> Option<String> {
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::path::absolute(path).ok()?
    };
    Url::from_file_path(absolute).ok().map(|u| u.to_string())
}

fn expand_m3u(acc: &mut Playlist, m3u_path: &str) {
    let Ok(text) = std::fs::read_to_string(m3u_path) else {
        return;
    };
    let base_dir = Path::new(m3u_path).parent().map(Path::to_path_buf);
    for line in text.lines() {
        let Some(entry) = crate::parse::m3u_entry(line) else {
            continue;
        };
        let entry_path = PathBuf::from(entry);
        let resolved = if entry_path.is_relative() {
            base_dir
                .as_deref()
                .map(|dir| dir.join(&entry_path))
                .unwrap_or(entry_path)
        } else {
            entry_path
        };
        expand_file(acc, &resolved.to_string_lossy());
    }
}

fn collect_random_files(dir_path: &str) -> Vec<String> {
    let mut uris: Vec<String> = WalkDir::new(dir_path)
        .max_depth(MAX_RECURSION_DEPTH as usize)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .filter_map(|e| file_uri(e.path()))
        .collect();
    uris.shuffle(&mut *process_rng().lock().unwrap());
    uris
}

fn expand_random(acc: &mut Playlist, dir_path: &str) {
    acc.extend(collect_random_files(dir_path));
}

fn expand_random_file(acc: &mut Playlist, dir_path: &str) {
    if let Some(first) = collect_random_files(dir_path).into_iter().next() {
        acc.push(first);
    }
}

fn expand_interleave(acc: &mut Playlist, data: &str, catalog: &Catalog, depth: u32) {
    let Some(tokens) = crate::parse::tokenize_n(data, 4) else {
        return;
    };
    let [name_a, name_b, n_a, n_b] = <[String; 4]>::try_from(tokens).unwrap();
    let n_a = n_a.parse::<usize>().unwrap_or(0).max(1);
    let n_b = n_b.parse::<usize>().unwrap_or(0).max(1);

    let mut pa = Playlist::new();
    expand(&mut pa, &name_a, catalog, depth + 1);
    if pa.is_empty() {
        return;
    }
    let mut pb = Playlist::new();
    expand(&mut pb, &name_b, catalog, depth + 1);
    if pb.is_empty() {
        return;
    }

    let (mut ia, mut ib) = (0, 0);
    while ia < pa.len() || ib < pb.len() {
        for _ in 0..n_a {
            if ia < pa.len() {
                acc.push(pa[ia].clone());
                ia += 1;
            }
        }
        for _ in 0..n_b {
            if ib < pb.len() {
                acc.push(pb[ib].clone());
                ib += 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::Catalog;
    use pretty_assertions::assert_eq;
    use std::io::Write;

    #[test]
    fn file_rule_escapes_an_already_valid_uri() {
        let mut acc = Playlist::new();
        expand_file(&mut acc, "http://example.com/a b.mp3");
        assert_eq!(acc, vec!["http://example.com/a%20b.mp3"]);
    }

    #[test]
    fn file_rule_reserved_chars_survive_escaping() {
        let mut acc = Playlist::new();
        expand_file(&mut acc, "http://example.com/a,b;c:d.mp3");
        assert_eq!(acc, vec!["http://example.com/a,b;c:d.mp3"]);
    }

    #[test]
    fn file_rule_converts_an_existing_path() {
        let dir = std::env::temp_dir().join(format!("drivetime-test-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let file_path = dir.join("song.ogg");
        std::fs::write(&file_path, b"x").unwrap();

        let mut acc = Playlist::new();
        expand_file(&mut acc, file_path.to_str().unwrap());
        assert_eq!(acc.len(), 1);
        assert!(acc[0].starts_with("file://"));

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn file_rule_appends_nothing_for_missing_path() {
        let mut acc = Playlist::new();
        expand_file(&mut acc, "/does/not/exist.mp3");
        assert!(acc.is_empty());
    }

    #[test]
    fn interleave_ordering_matches_scenario_3() {
        let dir = std::env::temp_dir().join(format!("drivetime-test-interleave-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let m3u_path = dir.join("tracks.m3u");
        let mut f = std::fs::File::create(&m3u_path).unwrap();
        for name in ["s1", "s2", "s3", "s4", "s5"] {
            writeln!(f, "{}.mp3", name).unwrap();
            std::fs::write(dir.join(format!("{name}.mp3")), b"x").unwrap();
        }
        std::fs::write(dir.join("j.mp3"), b"x").unwrap();

        let catalog = Catalog::parse(&format!(
            "jingles file {dir}/j.mp3\nsongs playlist {m3u}\nsongs_block interleave (songs jingles 3 1)\n",
            dir = dir.display(),
            m3u = m3u_path.display(),
        ));

        let mut acc = Playlist::new();
        expand(&mut acc, "songs_block", &catalog, 0);

        let names: Vec<_> = acc
            .iter()
            .map(|uri| uri.rsplit('/').next().unwrap().to_string())
            .collect();
        assert_eq!(
            names,
            vec!["s1.mp3", "s2.mp3", "s3.mp3", "j.mp3", "s4.mp3", "s5.mp3", "j.mp3"]
        );

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn interleave_recursion_cap_terminates_and_yields_nothing() {
        let catalog = Catalog::parse("a interleave (a a 1 1)\n");
        let mut acc = Playlist::new();
        expand(&mut acc, "a", &catalog, 0);
        assert!(acc.is_empty());
    }

    #[test]
    fn interleave_with_an_empty_side_appends_nothing() {
        let catalog = Catalog::parse("a file /does/not/exist.mp3\nb interleave (a a 1 1)\n");
        let mut acc = Playlist::new();
        expand(&mut acc, "b", &catalog, 0);
        assert!(acc.is_empty());
    }

    #[test]
    fn unknown_block_name_appends_nothing() {
        let catalog = Catalog::default();
        let mut acc = Playlist::new();
        expand(&mut acc, "missing", &catalog, 0);
        assert!(acc.is_empty());
    }
}
