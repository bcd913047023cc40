//! Annotation box content

use serde::{Deserialize, Serialize};

use crate::coords::Coordinates;

/// Column width for wrapped remarks
pub const REMARKS_WRAP_WIDTH: usize = 15;
/// Hanging indent for remark continuation lines
pub const REMARKS_INDENT: &str = "     ";

/// Text fields printed on the sheet
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Annotation {
    pub address: String,
    pub customer: String,
    pub property_name: String,
    pub vehicle_type: String,
    pub remarks: String,
}

impl Annotation {
    /// Lines of the annotation box in print order
    pub fn lines(&self, at: Coordinates) -> Vec<String> {
        let mut lines = Vec::with_capacity(5);

        if self.address.is_empty() {
            lines.push(format!("座標: {}", at));
        } else {
            lines.push(format!("〒{}", self.address));
        }
        if !self.customer.is_empty() {
            lines.push(format!("得意先: {}", self.customer));
        }
        if !self.property_name.is_empty() {
            lines.push(format!("物件名: {}", self.property_name));
        }
        lines.push(format!("車種: {}", self.vehicle_type));

        let mut remarks = wrap_hanging(&self.remarks, REMARKS_WRAP_WIDTH, REMARKS_INDENT).into_iter();
        if let Some(first) = remarks.next() {
            lines.push(format!("備考: {}", first));
            lines.extend(remarks);
        }

        lines
    }

    /// PDF title metadata
    pub fn title(&self) -> String {
        format!("{} {}", self.property_name, self.address)
    }
}

/// Greedy word wrap at `width` characters. Continuation lines start with
/// `indent`; words longer than a line are split.
pub fn wrap_hanging(text: &str, width: usize, indent: &str) -> Vec<String> {
    let indent_len = indent.chars().count();
    let width = width.max(indent_len + 1);

    let mut lines = Vec::new();
    let mut line = String::new();
    let mut len = 0;
    let mut has_content = false;

    let mut flush = |line: &mut String, len: &mut usize, has_content: &mut bool| {
        lines.push(std::mem::replace(line, indent.to_string()));
        *len = indent_len;
        *has_content = false;
    };

    for word in text.split_whitespace() {
        let mut rest: Vec<char> = word.chars().collect();
        while !rest.is_empty() {
            let sep = usize::from(has_content);
            if len + sep + rest.len() <= width {
                if has_content {
                    line.push(' ');
                }
                len += sep + rest.len();
                line.extend(rest.drain(..));
                has_content = true;
                break;
            }

            if has_content && rest.len() <= width - indent_len {
                flush(&mut line, &mut len, &mut has_content);
                continue;
            }

            let room = width.saturating_sub(len + sep);
            if room == 0 {
                flush(&mut line, &mut len, &mut has_content);
                continue;
            }
            if has_content {
                line.push(' ');
            }
            line.extend(rest.drain(..room));
            flush(&mut line, &mut len, &mut has_content);
        }
    }

    if has_content {
        lines.push(line);
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn at() -> Coordinates {
        Coordinates::new(35.681236, 139.767125).unwrap()
    }

    #[test]
    fn test_full_annotation() {
        let a = Annotation {
            address: "東京都千代田区丸の内1丁目".into(),
            customer: "山田商事".into(),
            property_name: "丸の内ビル".into(),
            vehicle_type: "4t".into(),
            remarks: "裏口から入る".into(),
        };
        assert_eq!(
            a.lines(at()),
            vec![
                "〒東京都千代田区丸の内1丁目",
                "得意先: 山田商事",
                "物件名: 丸の内ビル",
                "車種: 4t",
                "備考: 裏口から入る",
            ]
        );
    }

    #[test]
    fn test_coordinates_line_without_address() {
        let a = Annotation {
            vehicle_type: "車種指定なし".into(),
            ..Default::default()
        };
        assert_eq!(
            a.lines(at()),
            vec!["座標: 35.681236,139.767125", "車種: 車種指定なし"]
        );
    }

    #[test]
    fn test_wrap_words() {
        assert_eq!(
            wrap_hanging("park at the back gate please", 15, "     "),
            vec!["park at the", "     back gate", "     please"]
        );
    }

    #[test]
    fn test_wrap_long_run_without_spaces() {
        let text = "あいうえおかきくけこさしすせそたちつてとなにぬねの";
        let lines = wrap_hanging(text, 15, "     ");
        assert_eq!(
            lines,
            vec![
                "あいうえおかきくけこさしすせそ",
                "     たちつてとなにぬねの",
            ]
        );
        for line in &lines {
            assert!(line.chars().count() <= 15);
        }
    }

    #[test]
    fn test_wrap_empty() {
        assert!(wrap_hanging("   ", 15, "     ").is_empty());
    }

    #[test]
    fn test_multiline_remarks() {
        let a = Annotation {
            vehicle_type: "2t".into(),
            remarks: "first line of a long remark".into(),
            ..Default::default()
        };
        let lines = a.lines(at());
        assert_eq!(lines[2], "備考: first line of a");
        assert_eq!(lines[3], "     long");
        assert_eq!(lines[4], "     remark");
    }

    #[test]
    fn test_title() {
        let a = Annotation {
            address: "東京駅".into(),
            property_name: "駅前倉庫".into(),
            ..Default::default()
        };
        assert_eq!(a.title(), "駅前倉庫 東京駅");
    }
}
