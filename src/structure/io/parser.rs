use crate::structure::atom::Atom;

/// Fixed-column field, None if the line is too short or not ASCII there
fn field(line: &str, start: usize, end: usize) -> Option<&str> {
    line.get(start..end)
}

fn byte_at(line: &str, idx: usize) -> u8 {
    line.as_bytes().get(idx).copied().unwrap_or(b' ')
}

pub fn parse_line(line: &str) -> Result<Atom, &'static str> {
    // Coordinates end at column 54; occupancy and b-factor are optional
    if line.len() < 54 {
        return Err("Line is too short to hold coordinates");
    }
    let coordinate = |start: usize, end: usize| {
        field(line, start, end)
            .and_then(|s| s.trim().parse::<f64>().ok())
            .ok_or("Error parsing coordinate")
    };
    let x = coordinate(30, 38)?;
    let y = coordinate(38, 46)?;
    let z = coordinate(46, 54)?;
    let atom_name = field(line, 12, 16).ok_or("Error parsing atom name").and_then(parse_atom)?;
    let res_name = field(line, 17, 20).ok_or("Error parsing residue name").and_then(parse_residue)?;
    let res_serial = field(line, 22, 26)
        .and_then(|s| s.trim().parse::<i64>().ok())
        .ok_or("Error parsing residue serial")?;
    // Serial numbers overflow the column in large files; they are not needed downstream
    let atom_serial = field(line, 6, 11)
        .and_then(|s| s.trim().parse::<u64>().ok())
        .unwrap_or(0);
    let b_factor = match field(line, 60, 66) {
        Some(s) if !s.trim().is_empty() => {
            s.trim().parse::<f32>().map_err(|_| "Error parsing b-factor")?
        }
        _ => 0.0,
    };

    Ok(Atom {
        x,
        y,
        z,
        atom_name,
        atom_serial,
        alt_loc: byte_at(line, 16),
        res_name,
        res_serial,
        insertion_code: byte_at(line, 26),
        chain: byte_at(line, 21),
        b_factor,
        line: line.trim_end().to_string(),
    })
}

pub fn parse_atom(name: &str) -> Result<[u8; 4], &'static str> {
    let bytes = name.as_bytes();
    // Check atom name is 4 ASCII characters
    match bytes.len() {
        4 => Ok([bytes[0], bytes[1], bytes[2], bytes[3]]),
        _ => Err("Atom name is not 4 characters long"),
    }
}

pub fn parse_residue(name: &str) -> Result<[u8; 3], &'static str> {
    let bytes = name.as_bytes();
    // Check residue name is 3 ASCII characters
    match bytes.len() {
        3 => Ok([bytes[0], bytes[1], bytes[2]]),
        _ => Err("Residue name is not 3 characters long"),
    }
}

#[cfg(test)]
mod parser_tests {
    use super::*;

    #[test]
    fn test_parse_atom() {
        let atom_name = "CA  ";
        let atom_name_bytes = parse_atom(atom_name).unwrap();
        assert_eq!(atom_name_bytes, [67, 65, 32, 32]);
        assert!(parse_atom("CA").is_err());
        assert!(parse_atom("CA   ").is_err());
    }

    #[test]
    fn test_parse_residue() {
        assert_eq!(parse_residue("ALA").unwrap(), [65, 76, 65]);
        assert!(parse_residue("ALAN").is_err());
        assert!(parse_residue("AL").is_err());
    }

    #[test]
    fn test_parse_line_success() {
        let line = "ATOM      1  N   ALA A 340      -2.311   2.993 -33.448  1.00  6.00           N  ";
        let atom = parse_line(line).unwrap();
        assert_eq!(atom.atom_name, [32, 78, 32, 32]); // N
        assert_eq!(atom.res_name, [65, 76, 65]); // ALA
        assert_eq!(atom.chain, b'A');
        assert_eq!(atom.atom_serial, 1);
        assert_eq!(atom.res_serial, 340);
        assert_eq!(atom.alt_loc, b' ');
        assert_eq!(atom.insertion_code, b' ');
        assert_eq!(atom.get_coordinate(), [-2.311, 2.993, -33.448]);
        assert_eq!(atom.b_factor, 6.00);
        assert_eq!(atom.line.len(), 78);
    }

    #[test]
    fn test_parse_line_without_b_factor() {
        let line = "ATOM     12  CA  GLY B  -3A     10.000  10.000  10.000";
        let atom = parse_line(line).unwrap();
        assert_eq!(atom.res_serial, -3);
        assert_eq!(atom.insertion_code, b'A');
        assert_eq!(atom.chain, b'B');
        assert!(atom.is_ca());
        assert_eq!(atom.b_factor, 0.0);
    }

    #[test]
    fn test_parse_line_fail() {
        // Short line
        let line = "ATOM      1  N   ALA A   1      10.000  10.000  10.0";
        assert!(parse_line(line).is_err());
        // Error in X
        let line = "ATOM      1  N   ALA A   1      1A.000  10.000  10.000  1.00  0.00           N  ";
        assert!(parse_line(line).is_err());
        // Error in Z
        let line = "ATOM      1  N   ALA A   1      10.000  10.000  1A.000  1.00  0.00           N  ";
        assert!(parse_line(line).is_err());
        // Error in B-factor
        let line = "ATOM      1  N   ALA A   1      10.000  10.000  10.000  1.00  0.A0           N  ";
        assert!(parse_line(line).is_err());
        // Error in residue serial
        let line = "ATOM      1  N   ALA A 3A0      -2.311   2.993 -33.448  1.00  6.00           N  ";
        assert!(parse_line(line).is_err());
    }
}
