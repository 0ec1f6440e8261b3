use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::{env, fs, io};

/// Reads a text file and returns all its non-empty lines as a `Vec<String>`.
///
/// - Reads the entire file into memory
/// - Splits on `\n` / `\r\n`
pub fn read_file<P: AsRef<Path>>(filename: P) -> io::Result<Vec<String>> {
	let mut contents = String::new();
	File::open(filename)?.read_to_string(&mut contents)?;
	Ok(contents
		.lines()
		.filter(|line| !line.trim().is_empty())
		.map(str::to_owned)
		.collect())
}

/// Encodes a group id into a file stem safe on every platform.
///
/// ASCII alphanumerics, `-` and `_` are kept; every other byte becomes `%XX`.
///
/// Example:
/// `"guild:42"` → `"guild%3A42"`
pub fn encode_group(group: &str) -> String {
	let mut encoded = String::with_capacity(group.len());
	for byte in group.bytes() {
		if byte.is_ascii_alphanumeric() || byte == b'-' || byte == b'_' {
			encoded.push(byte as char);
		} else {
			encoded.push_str(&format!("%{byte:02X}"));
		}
	}
	encoded
}

/// Reverses [`encode_group`].
///
/// Returns `None` if the stem is not a valid encoding.
pub fn decode_group(stem: &str) -> Option<String> {
	let bytes = stem.as_bytes();
	let mut decoded = Vec::with_capacity(bytes.len());
	let mut i = 0;
	while i < bytes.len() {
		if bytes[i] == b'%' {
			let hex = stem.get(i + 1..i + 3)?;
			decoded.push(u8::from_str_radix(hex, 16).ok()?);
			i += 3;
		} else {
			decoded.push(bytes[i]);
			i += 1;
		}
	}
	String::from_utf8(decoded).ok()
}

/// Builds the file path storing a group's corpus.
///
/// Example:
/// `data/` + `"guild:42"` + `"json"` → `data/guild%3A42.json`
pub fn build_group_path<P: AsRef<Path>>(folder: P, group: &str, extension: &str) -> PathBuf {
	let mut output = folder.as_ref().join(encode_group(group));
	output.set_extension(extension);
	output
}

/// Extracts the group id from a corpus file path.
///
/// Examples:
/// - `"./data/guild%3A42.json"` → `"guild:42"`
/// - `"lobby.json"` → `"lobby"`
pub fn get_group<P: AsRef<Path>>(input_path: P) -> io::Result<String> {
	let stem = input_path
		.as_ref()
		.file_stem()
		.ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "Path has no filename"))?;

	decode_group(&stem.to_string_lossy())
		.ok_or_else(|| io::Error::new(io::ErrorKind::InvalidData, "Invalid group file name"))
}

/// Normalize a folder path.
///
/// - `"."` or `"./"` resolves to the current working directory
/// - Other paths are returned as-is (not canonicalized)
pub fn normalize_folder(input: &Path) -> PathBuf {
	if input == Path::new(".") || input == Path::new("./") {
		env::current_dir().unwrap_or_else(|_| PathBuf::from("."))
	} else {
		input.to_path_buf()
	}
}

/// Lists all files with a given extension in a directory.
///
/// Returns full paths, sorted.
pub fn list_files<P: AsRef<Path>>(dir: P, extension: &str) -> io::Result<Vec<PathBuf>> {
	let mut files = Vec::new();

	for entry in fs::read_dir(dir)? {
		let path = entry?.path();
		if path.is_file() && path.extension() == Some(std::ffi::OsStr::new(extension)) {
			files.push(path);
		}
	}

	files.sort();
	Ok(files)
}
