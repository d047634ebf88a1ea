//! # Error Suggestions
//!
//! Helpers that attach "hint:" lines to common failures so the CLI says how
//! to fix a problem, not only what went wrong.
//!
//! Each helper wraps the library [`Error`] it describes, so the error kind
//! printed by the CLI stays accurate.
//!
//! ```rust,ignore
//! return Err(suggestions::config_not_found(&path));
//! ```

use std::path::Path;

use crate::error::Error;

/// The configuration file does not exist.
pub fn config_not_found(path: &Path) -> anyhow::Error {
    let error = Error::config(format!("configuration file not found: {}", path.display()));
    let message = error.to_string();
    anyhow::Error::new(error).context(format!(
        "{message}\n\n\
         hint: Create a forkpatch.yaml file in your project root\n\
         hint: Use -c/--config to specify a different path\n\
         hint: Set the FORKPATCH_CONFIG environment variable"
    ))
}

/// Neither `--ref`, `FORKPATCH_REF` nor `upstream.ref` supplied a ref.
pub fn missing_ref() -> anyhow::Error {
    let error = Error::config("no upstream ref given");
    let message = error.to_string();
    anyhow::Error::new(error).context(format!(
        "{message}\n\n\
         hint: Pass --ref <commit> or set FORKPATCH_REF\n\
         hint: Pin a ref with 'ref:' in the upstream section of forkpatch.yaml"
    ))
}

/// No task is registered under `name`.
pub fn unknown_task(name: &str, known: &[&str]) -> anyhow::Error {
    let did_you_mean = find_similar(name, known)
        .map(|s| format!("\nhint: Did you mean '{s}'?"))
        .unwrap_or_default();

    let error = Error::UnknownTask {
        name: name.to_string(),
    };
    anyhow::Error::new(error).context(format!(
        "Unknown task '{name}'{did_you_mean}\n\n\
         Available tasks: sync, {tasks}\n\
         hint: Run 'forkpatch tasks' to list tasks with descriptions",
        tasks = known.join(", ")
    ))
}

/// A patch failed to apply.
pub fn patch_conflict(error: Error) -> anyhow::Error {
    let message = error.to_string();
    anyhow::Error::new(error).context(format!(
        "{message}\n\n\
         hint: Rebase the patch onto the new upstream ref, or pin the previous ref\n\
         hint: Run 'forkpatch run inspect-upstream' to see every descriptor"
    ))
}

/// Find a similar string from a list of candidates using edit distance.
///
/// Returns Some(candidate) if a close match is found (edit distance <= 2).
fn find_similar<'a>(input: &str, candidates: &[&'a str]) -> Option<&'a str> {
    candidates
        .iter()
        .filter_map(|&candidate| {
            let distance = edit_distance(input, candidate);
            if distance <= 2 && distance < input.len() {
                Some((candidate, distance))
            } else {
                None
            }
        })
        .min_by_key(|(_, distance)| *distance)
        .map(|(candidate, _)| candidate)
}

/// Levenshtein distance, two rows at a time.
fn edit_distance(a: &str, b: &str) -> usize {
    let b_chars: Vec<char> = b.chars().collect();
    let mut previous: Vec<usize> = (0..=b_chars.len()).collect();
    let mut current = vec![0; b_chars.len() + 1];

    for (i, ca) in a.chars().enumerate() {
        current[0] = i + 1;
        for (j, cb) in b_chars.iter().enumerate() {
            let cost = usize::from(ca != *cb);
            current[j + 1] = (previous[j + 1] + 1)
                .min(current[j] + 1)
                .min(previous[j] + cost);
        }
        std::mem::swap(&mut previous, &mut current);
    }

    previous[b_chars.len()]
}
