//! Helvetica metrics, WinAnsi encoding and greedy word wrap.
//!
//! Both renderers draw with the standard-14 Helvetica faces, so widths come
//! from the Adobe AFM tables (1/1000 em) for the printable ASCII range.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Face {
    Regular,
    Bold,
}

impl Face {
    pub fn base_font(&self) -> &'static str {
        match self {
            Face::Regular => "Helvetica",
            Face::Bold => "Helvetica-Bold",
        }
    }
}

#[rustfmt::skip]
const HELVETICA: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278,
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 278, 278, 584, 584, 584, 556,
    1015, 667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, 722, 778,
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 278, 278, 278, 469, 556,
    333, 556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, 556, 556,
    556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, 334, 260, 334, 584,
];

#[rustfmt::skip]
const HELVETICA_BOLD: [u16; 95] = [
    278, 333, 474, 556, 556, 889, 722, 238, 333, 333, 389, 584, 278, 333, 278, 278,
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 333, 333, 584, 584, 584, 611,
    975, 722, 722, 722, 722, 667, 611, 778, 722, 278, 556, 722, 611, 833, 722, 778,
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 333, 278, 333, 584, 556,
    333, 556, 611, 556, 611, 556, 333, 611, 611, 278, 278, 556, 278, 889, 611, 611,
    611, 611, 389, 556, 333, 611, 556, 778, 556, 556, 500, 389, 280, 389, 584,
];

/// WinAnsi byte for a character; unrepresentable characters become `?`.
pub fn win_ansi_byte(c: char) -> u8 {
    match c {
        ' '..='~' => c as u8,
        '\u{A0}'..='\u{FF}' => c as u32 as u8,
        '€' => 0x80,
        '‚' => 0x82,
        '„' => 0x84,
        '…' => 0x85,
        '‘' => 0x91,
        '’' => 0x92,
        '“' => 0x93,
        '”' => 0x94,
        '•' => 0x95,
        '–' => 0x96,
        '—' => 0x97,
        '™' => 0x99,
        '\t' => b' ',
        _ => b'?',
    }
}

pub fn encode_win_ansi(text: &str) -> Vec<u8> {
    text.chars().filter(|c| !c.is_control() || *c == '\t').map(win_ansi_byte).collect()
}

fn byte_width(face: Face, byte: u8) -> u16 {
    let table = match face {
        Face::Regular => &HELVETICA,
        Face::Bold => &HELVETICA_BOLD,
    };
    match byte {
        0x20..=0x7E => table[(byte - 0x20) as usize],
        0x85 => 1000,
        0x91 | 0x92 => 278,
        0x93 | 0x94 => if face == Face::Bold { 500 } else { 333 },
        0x95 => 350,
        0x96 => 556,
        0x97 => 1000,
        0x99 => 1000,
        _ => 556,
    }
}

/// Width of `text` in points at `size`, as drawn after WinAnsi encoding.
pub fn text_width(text: &str, face: Face, size: f32) -> f32 {
    let units: u32 = encode_win_ansi(text).into_iter().map(|b| u32::from(byte_width(face, b))).sum();
    units as f32 * size / 1000.0
}

/// Greedy word wrap: words accumulate on a line while it still fits in
/// `max_width`; a word wider than the whole line is broken by characters.
pub fn wrap_text(text: &str, max_width: f32, face: Face, size: f32) -> Vec<String> {
    let mut lines = Vec::new();
    let mut line = String::new();

    for word in text.split_whitespace() {
        let candidate = if line.is_empty() { word.to_string() } else { format!("{} {}", line, word) };
        if text_width(&candidate, face, size) <= max_width {
            line = candidate;
            continue;
        }
        if !line.is_empty() {
            lines.push(std::mem::take(&mut line));
        }
        if text_width(word, face, size) <= max_width {
            line = word.to_string();
        } else {
            let mut pieces = break_word(word, max_width, face, size);
            line = pieces.pop().unwrap_or_default();
            lines.extend(pieces);
        }
    }
    if !line.is_empty() {
        lines.push(line);
    }
    lines
}

/// Keeps the first `max_lines` lines. When anything is cut, the last kept
/// line ends with "…" and still fits in `max_width`.
pub fn clamp_lines(mut lines: Vec<String>, max_lines: usize, max_width: f32, face: Face, size: f32) -> Vec<String> {
    if lines.len() <= max_lines {
        return lines;
    }
    lines.truncate(max_lines);
    if let Some(last) = lines.last_mut() {
        while !last.is_empty() && text_width(&format!("{}…", last), face, size) > max_width {
            last.pop();
        }
        *last = format!("{}…", last.trim_end());
    }
    lines
}

fn break_word(word: &str, max_width: f32, face: Face, size: f32) -> Vec<String> {
    let mut pieces = Vec::new();
    let mut current = String::new();
    for c in word.chars() {
        current.push(c);
        if text_width(&current, face, size) > max_width && current.chars().count() > 1 {
            current.pop();
            pieces.push(std::mem::take(&mut current));
            current.push(c);
        }
    }
    if !current.is_empty() {
        pieces.push(current);
    }
    pieces
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    #[test]
    fn widths_follow_afm_tables() {
        assert_eq!(text_width("A", Face::Regular, 1000.0), 667.0);
        assert_eq!(text_width("A", Face::Bold, 1000.0), 722.0);
        assert_eq!(text_width("il", Face::Regular, 10.0), 4.44);
        assert_eq!(text_width("• x", Face::Regular, 1000.0), 350.0 + 278.0 + 500.0);
    }

    #[test]
    fn encoding_maps_typography_to_win_ansi() {
        assert_eq!(encode_win_ansi("a–b"), vec![b'a', 0x96, b'b']);
        assert_eq!(encode_win_ansi("• é"), vec![0x95, b' ', 0xE9]);
        assert_eq!(encode_win_ansi("中"), vec![b'?']);
    }

    #[test]
    fn wrap_breaks_on_word_boundaries() {
        let text = "Membimbing PGB membuat analisis SWOT dan menentukan KPI sekolah";
        let lines = wrap_text(text, 120.0, Face::Regular, 10.0);
        assert!(lines.len() > 1);
        for line in &lines {
            assert!(text_width(line, Face::Regular, 10.0) <= 120.0, "{line}");
        }
        assert_eq!(lines.join(" "), text);
    }

    #[test]
    fn wrap_of_blank_text_is_empty() {
        assert!(wrap_text("   \n\t", 100.0, Face::Regular, 11.0).is_empty());
    }

    #[test]
    fn overlong_words_are_broken() {
        let lines = wrap_text("https://storage.example/visit-images/1712345678-abcdef.jpg", 60.0, Face::Regular, 10.0);
        assert!(lines.len() > 1);
        assert!(lines.iter().all(|l| text_width(l, Face::Regular, 10.0) <= 60.0));
        assert_eq!(lines.concat(), "https://storage.example/visit-images/1712345678-abcdef.jpg");
    }

    #[test]
    fn clamped_lines_end_with_an_ellipsis() {
        let lines = wrap_text(&"Perhimpunan pagi di dataran sekolah ".repeat(20), 150.0, Face::Regular, 9.0);
        assert!(lines.len() > 3);
        let clamped = clamp_lines(lines.clone(), 3, 150.0, Face::Regular, 9.0);
        assert_eq!(clamped.len(), 3);
        assert_eq!(clamped[..2], lines[..2]);
        assert!(clamped[2].ends_with('…'));
        assert!(text_width(&clamped[2], Face::Regular, 9.0) <= 150.0);

        let short = vec!["Dewan".to_string()];
        assert_eq!(clamp_lines(short.clone(), 3, 150.0, Face::Regular, 9.0), short);
    }

    proptest! {
        #[test]
        fn wrapped_lines_fit_and_preserve_words(
            words in proptest::collection::vec("[A-Za-z0-9,.]{1,10}", 0..40),
            max_width in 120.0f32..500.0,
            bold in any::<bool>(),
        ) {
            let face = if bold { Face::Bold } else { Face::Regular };
            let text = words.join(" ");
            let lines = wrap_text(&text, max_width, face, 11.0);
            for line in &lines {
                prop_assert!(text_width(line, face, 11.0) <= max_width);
            }
            let rejoined: Vec<String> = lines.iter().flat_map(|l| l.split_whitespace().map(String::from)).collect();
            prop_assert_eq!(rejoined, words);
        }
    }
}
