//! Generates the precompiled const string table from `strtab/const_strings.txt`.

use std::collections::HashSet;
use std::env;
use std::fmt::Write as _;
use std::fs;
use std::path::PathBuf;

const SHORT_STR_MAX_LEN: usize = 64;

/// FNV-1a, 32 bit. Must agree with the runtime's `str_hash`.
fn str_hash(bytes: &[u8]) -> u32 {
    let mut hash: u32 = 2166136261;
    for &b in bytes {
        hash = (hash ^ b as u32).wrapping_mul(16777619);
    }
    hash
}

fn parse_list(text: &str) -> Vec<(String, u8)> {
    let mut seen = HashSet::new();
    let mut entries = Vec::new();
    for (lineno, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let mut parts = line.split_whitespace();
        let Some(word) = parts.next() else {
            continue;
        };
        let extra = match parts.next() {
            Some(tag) => tag.parse::<u8>().unwrap_or_else(|_| {
                panic!("const_strings.txt:{}: bad extra tag `{tag}`", lineno + 1)
            }),
            None => 0,
        };
        assert!(
            word.len() <= SHORT_STR_MAX_LEN,
            "const_strings.txt:{}: `{word}` exceeds the short string limit",
            lineno + 1
        );
        if seen.insert(word.to_string()) {
            entries.push((word.to_string(), extra));
        }
    }
    assert!(entries.len() < u16::MAX as usize, "too many const strings");
    entries
}

fn main() {
    let manifest_dir = PathBuf::from(env::var("CARGO_MANIFEST_DIR").unwrap());
    let list_path = manifest_dir.join("strtab").join("const_strings.txt");
    println!("cargo:rerun-if-changed=build.rs");
    println!("cargo:rerun-if-changed={}", list_path.display());

    let text = fs::read_to_string(&list_path)
        .unwrap_or_else(|e| panic!("cannot read {}: {e}", list_path.display()));
    let entries = parse_list(&text);

    // bucket = hash % size, chains kept in list order
    let size = entries.len().max(1);
    let hashes: Vec<u32> = entries.iter().map(|(w, _)| str_hash(w.as_bytes())).collect();
    let mut heads: Vec<Option<usize>> = vec![None; size];
    let mut tails: Vec<Option<usize>> = vec![None; size];
    let mut next: Vec<Option<usize>> = vec![None; entries.len()];
    for (i, hash) in hashes.iter().enumerate() {
        let bucket = *hash as usize % size;
        match tails[bucket] {
            Some(tail) => next[tail] = Some(i),
            None => heads[bucket] = Some(i),
        }
        tails[bucket] = Some(i);
    }

    let fmt_link = |link: Option<usize>| match link {
        Some(i) => format!("Some({i})"),
        None => "None".to_string(),
    };

    let mut out = String::new();
    out.push_str("// @generated by build.rs from strtab/const_strings.txt. Do not edit.\n\n");
    writeln!(out, "static CONST_STR_ENTRIES: [ConstStr; {}] = [", entries.len()).unwrap();
    for (i, (word, extra)) in entries.iter().enumerate() {
        writeln!(
            out,
            "    ConstStr::new(b\"{}\", 0x{:08x}, {}, {}),",
            word.as_bytes().escape_ascii(),
            hashes[i],
            extra,
            fmt_link(next[i])
        )
        .unwrap();
    }
    out.push_str("];\n\n");
    writeln!(out, "static CONST_STR_BUCKETS: [Option<u16>; {size}] = [").unwrap();
    for head in &heads {
        writeln!(out, "    {},", fmt_link(*head)).unwrap();
    }
    out.push_str("];\n");

    let out_path = PathBuf::from(env::var("OUT_DIR").unwrap()).join("const_strtab_def.rs");
    fs::write(&out_path, out)
        .unwrap_or_else(|e| panic!("cannot write {}: {e}", out_path.display()));
}
