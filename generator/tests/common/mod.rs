#![allow(dead_code)]

use std::{fs, path::Path};

pub fn write(path: impl AsRef<Path>, content: &str) {
    let path = path.as_ref();
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

/// Write a compiled gettext catalog, like `pybabel compile` would.
///
/// Plural messages are given as `"singular\0plural"` / `"form0\0form1"`.
pub fn write_mo(path: impl AsRef<Path>, messages: &[(&str, &str)]) {
    let mut messages: Vec<(&str, &str)> =
        std::iter::once(("", "Content-Type: text/plain; charset=UTF-8\n"))
            .chain(messages.iter().copied())
            .collect();
    messages.sort_by_key(|(id, _)| *id);

    let n = u32::try_from(messages.len()).unwrap();
    let originals_offset = 28;
    let translations_offset = originals_offset + 8 * n;
    let strings_offset = translations_offset + 8 * n;

    let mut tables = Vec::new();
    let mut strings = Vec::new();
    let originals = messages.iter().map(|(id, _)| *id);
    let translations = messages.iter().map(|(_, msg)| *msg);
    for s in originals.chain(translations) {
        let offset = strings_offset + u32::try_from(strings.len()).unwrap();
        tables.extend(u32::try_from(s.len()).unwrap().to_le_bytes());
        tables.extend(offset.to_le_bytes());
        strings.extend(s.as_bytes());
        strings.push(0);
    }

    let mut out = Vec::new();
    for word in [0x9504_12de_u32, 0, n, originals_offset, translations_offset, 0, 0] {
        out.extend(word.to_le_bytes());
    }
    out.extend(tables);
    out.extend(strings);

    let path = path.as_ref();
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, out).unwrap();
}
