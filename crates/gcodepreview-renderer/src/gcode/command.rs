//! Per-line G-code command model.

use tracing::warn;

/// Command kinds the interpreter dispatches on.
///
/// Anything that affects neither nozzle position nor positioning mode maps
/// to [`CommandKind::Other`] and is ignored downstream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandKind {
    /// G0 — rapid linear move.
    Rapid,
    /// G1 — linear move.
    Linear,
    /// G2 — clockwise arc.
    ArcCw,
    /// G3 — counter-clockwise arc.
    ArcCcw,
    /// G90 — absolute positioning.
    Absolute,
    /// G91 — relative positioning.
    Relative,
    /// G92 — position redefinition; intentionally not modeled.
    SetPosition,
    /// Full-line comment.
    Comment,
    /// Any other word.
    Other,
}

impl CommandKind {
    fn from_token(token: &str) -> Self {
        if token.starts_with(';') {
            return Self::Comment;
        }
        match token.to_ascii_uppercase().as_str() {
            "G0" | "G00" => Self::Rapid,
            "G1" | "G01" => Self::Linear,
            "G2" | "G02" => Self::ArcCw,
            "G3" | "G03" => Self::ArcCcw,
            "G90" => Self::Absolute,
            "G91" => Self::Relative,
            "G92" => Self::SetPosition,
            _ => Self::Other,
        }
    }
}

/// One parsed command line.
///
/// Numeric parameters are present-or-absent, never defaulted to zero. A
/// field that fails to parse is logged and left absent; the rest of the
/// line (and file) still parses.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Command {
    pub kind: CommandKind,
    pub x: Option<f64>,
    pub y: Option<f64>,
    pub z: Option<f64>,
    pub e: Option<f64>,
    pub f: Option<f64>,
    pub i: Option<f64>,
    pub j: Option<f64>,
    pub k: Option<f64>,
    pub r: Option<f64>,
}

impl Command {
    /// Parse a single non-empty line.
    ///
    /// The first whitespace-separated token is the command word; subsequent
    /// tokens are `<letter><number>` parameters. A token starting with `;`
    /// ends the parameter list; a token containing `;` is truncated at it.
    pub fn parse(line: &str) -> Self {
        let mut tokens = line.split_whitespace();
        let kind = tokens
            .next()
            .map(CommandKind::from_token)
            .unwrap_or(CommandKind::Other);

        let mut command = Self {
            kind,
            x: None,
            y: None,
            z: None,
            e: None,
            f: None,
            i: None,
            j: None,
            k: None,
            r: None,
        };

        for token in tokens {
            if token.starts_with(';') {
                break;
            }
            let token = token.split(';').next().unwrap_or(token);
            command.set_parameter(token, line);
        }
        command
    }

    fn set_parameter(&mut self, token: &str, line: &str) {
        let Some(letter) = token.chars().next() else {
            return;
        };
        let Some(digits) = token.get(1..) else {
            return;
        };
        if digits.is_empty() {
            return;
        }
        let value = match digits.parse::<f64>() {
            Ok(value) => Some(value),
            Err(err) => {
                warn!("skipping malformed parameter {:?} in {:?}: {}", token, line, err);
                return;
            }
        };
        match letter.to_ascii_uppercase() {
            'X' => self.x = value,
            'Y' => self.y = value,
            'Z' => self.z = value,
            'E' => self.e = value,
            'F' => self.f = value,
            'I' => self.i = value,
            'J' => self.j = value,
            'K' => self.k = value,
            'R' => self.r = value,
            _ => {}
        }
    }

    /// True when any cartesian axis is commanded.
    pub fn has_axis_word(&self) -> bool {
        self.x.is_some() || self.y.is_some() || self.z.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_linear_move_with_parameters() {
        let command = Command::parse("G1 X10.5 Y-3 Z0.2 E0.8 F1800");
        assert_eq!(command.kind, CommandKind::Linear);
        assert_eq!(command.x, Some(10.5));
        assert_eq!(command.y, Some(-3.0));
        assert_eq!(command.z, Some(0.2));
        assert_eq!(command.e, Some(0.8));
        assert_eq!(command.f, Some(1800.0));
        assert_eq!(command.i, None);
    }

    #[test]
    fn arc_offsets_are_captured() {
        let command = Command::parse("G2 X10 Y0 I5 J-2.5 K1");
        assert_eq!(command.kind, CommandKind::ArcCw);
        assert_eq!(command.i, Some(5.0));
        assert_eq!(command.j, Some(-2.5));
        assert_eq!(command.k, Some(1.0));
    }

    #[test]
    fn comment_token_ends_parameter_list() {
        let command = Command::parse("G1 X5 ;skirt Y9");
        assert_eq!(command.x, Some(5.0));
        assert_eq!(command.y, None);
    }

    #[test]
    fn inline_comment_truncates_parameter() {
        let command = Command::parse("G1 X5;wipe");
        assert_eq!(command.x, Some(5.0));
    }

    #[test]
    fn malformed_parameter_is_skipped() {
        let command = Command::parse("G1 Xabc Y7 E1");
        assert_eq!(command.x, None);
        assert_eq!(command.y, Some(7.0));
        assert_eq!(command.e, Some(1.0));
    }

    #[test]
    fn bare_letter_is_left_absent() {
        let command = Command::parse("G1 X Y2");
        assert_eq!(command.x, None);
        assert_eq!(command.y, Some(2.0));
    }

    #[test]
    fn lowercase_words_are_recognized() {
        let command = Command::parse("g1 x4 e0.1");
        assert_eq!(command.kind, CommandKind::Linear);
        assert_eq!(command.x, Some(4.0));
        assert_eq!(command.e, Some(0.1));
    }

    #[test]
    fn unknown_word_maps_to_other() {
        assert_eq!(Command::parse("M104 S200").kind, CommandKind::Other);
        assert_eq!(Command::parse("G28").kind, CommandKind::Other);
    }
}
