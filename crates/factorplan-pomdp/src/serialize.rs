//! α-vector-list text serialization (§6): one VEntry per line (`S` values,
//! then the action id, then observation back-pointers), `@` terminating a
//! horizon, two consecutive `@` lines ending the stream.
//!
//! Full Cassandra-format MDP/POMDP parsing is out of scope (§1); this is
//! the one stream format the core itself owns, since §8's round-trip
//! property is stated in terms of it.

use std::fmt::Write as _;

use factorplan_core::alpha::AlphaVector;
use factorplan_error::{FactorplanResult, ResultExt, factorplan_err};

/// Writes a sequence of horizons (oldest first) to the text format.
pub fn write_horizons(horizons: &[Vec<AlphaVector>]) -> String {
    let mut out = String::new();
    for horizon in horizons {
        for alpha in horizon {
            write_entry(&mut out, alpha);
        }
        out.push_str("@\n");
    }
    out.push_str("@\n");
    out
}

fn write_entry(out: &mut String, alpha: &AlphaVector) {
    for v in &alpha.values {
        write!(out, "{} ", v).unwrap();
    }
    write!(out, "{}", alpha.action).unwrap();
    for &bp in &alpha.backpointers {
        write!(out, " {}", bp).unwrap();
    }
    out.push('\n');
}

/// Parses the text format back into a sequence of horizons. `state_count`
/// and `action_count` bound the fields of every entry; each entry's
/// back-pointers must be smaller than the size of the *previous* parsed
/// horizon's list (the first parsed horizon must carry none). Any
/// malformed line aborts the whole parse without returning a partial
/// result.
pub fn read_horizons(text: &str, state_count: usize, action_count: usize) -> FactorplanResult<Vec<Vec<AlphaVector>>> {
    let mut horizons: Vec<Vec<AlphaVector>> = Vec::new();
    let mut current: Vec<AlphaVector> = Vec::new();
    let mut previous_len: Option<usize> = None;

    for (line_number, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if line == "@" {
            if current.is_empty() {
                return Ok(horizons);
            }
            previous_len = Some(current.len());
            horizons.push(std::mem::take(&mut current));
            continue;
        }
        let entry = parse_entry(line, state_count, action_count, previous_len)
            .context(format!("line {}", line_number + 1))?;
        current.push(entry);
    }
    Ok(horizons)
}

fn parse_entry(
    line: &str,
    state_count: usize,
    action_count: usize,
    previous_len: Option<usize>,
) -> FactorplanResult<AlphaVector> {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    if tokens.len() < state_count + 1 {
        return Err(factorplan_err!(MalformedInput: "value-function line has too few fields: {:?}", line));
    }

    let mut values = Vec::with_capacity(state_count);
    for token in &tokens[..state_count] {
        let value: f64 = token
            .parse()
            .map_err(|_| factorplan_err!(MalformedInput: "invalid state value {:?}", token))?;
        values.push(value);
    }

    let action: usize = tokens[state_count]
        .parse()
        .map_err(|_| factorplan_err!(MalformedInput: "invalid action id {:?}", tokens[state_count]))?;
    if action >= action_count {
        return Err(factorplan_err!(MalformedInput: "action {} out of range (A={})", action, action_count));
    }

    let mut backpointers = Vec::with_capacity(tokens.len().saturating_sub(state_count + 1));
    for token in &tokens[state_count + 1..] {
        let backpointer: usize = token
            .parse()
            .map_err(|_| factorplan_err!(MalformedInput: "invalid back-pointer {:?}", token))?;
        match previous_len {
            Some(len) if backpointer < len => {}
            _ => {
                return Err(
                    factorplan_err!(MalformedInput: "back-pointer {} has no matching previous horizon entry", backpointer),
                );
            }
        }
        backpointers.push(backpointer);
    }

    Ok(AlphaVector::new(values, action, backpointers))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_a_two_horizon_value_function() {
        let horizon0 = vec![AlphaVector::new(vec![0.0, 0.0], 0, vec![])];
        let horizon1 = vec![
            AlphaVector::new(vec![-1.0, -1.0], 0, vec![0, 0]),
            AlphaVector::new(vec![-100.0, 10.0], 1, vec![0, 0]),
        ];
        let horizons = vec![horizon0, horizon1];

        let text = write_horizons(&horizons);
        let parsed = read_horizons(&text, 2, 2).unwrap();

        assert_eq!(parsed.len(), horizons.len());
        for (original, round_tripped) in horizons.iter().zip(parsed.iter()) {
            assert_eq!(original.len(), round_tripped.len());
            for (a, b) in original.iter().zip(round_tripped.iter()) {
                assert_eq!(a.action, b.action);
                assert_eq!(a.backpointers, b.backpointers);
                for (x, y) in a.values.iter().zip(b.values.iter()) {
                    assert!((x - y).abs() < 1e-10);
                }
            }
        }
    }

    #[test]
    fn action_out_of_range_is_malformed_input() {
        let text = "0.0 0.0 5\n@\n@\n";
        assert!(read_horizons(text, 2, 2).is_err());
    }

    #[test]
    fn backpointer_into_a_nonexistent_previous_horizon_is_malformed_input() {
        let text = "0.0 0.0 0\n@\n-1.0 -1.0 0 3\n@\n@\n";
        assert!(read_horizons(text, 2, 2).is_err());
    }

    #[test]
    fn too_few_fields_is_malformed_input() {
        let text = "0.0\n@\n@\n";
        assert!(read_horizons(text, 2, 2).is_err());
    }
}
