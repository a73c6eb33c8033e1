use super::texts;

/// Reply markup attached to an outgoing message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Keyboard {
    /// Hide any keyboard currently shown.
    Remove,
    Reply(ReplyKeyboard),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplyKeyboard {
    pub rows: Vec<Vec<String>>,
    pub resize: bool,
    pub one_time: bool,
}

impl Keyboard {
    /// Main menu: style, prompt and help buttons.
    pub fn start() -> Self {
        Keyboard::Reply(ReplyKeyboard {
            rows: vec![
                vec![
                    texts::BUTTON_STYLE.to_string(),
                    texts::BUTTON_PROMPT.to_string(),
                ],
                vec![texts::BUTTON_HELP.to_string()],
            ],
            resize: true,
            one_time: true,
        })
    }

    /// One button per style title, two per row.
    pub fn styles(titles: &[String]) -> Self {
        Keyboard::Reply(ReplyKeyboard {
            rows: titles.chunks(2).map(|row| row.to_vec()).collect(),
            resize: true,
            one_time: false,
        })
    }

    pub fn rows(&self) -> &[Vec<String>] {
        match self {
            Keyboard::Remove => &[],
            Keyboard::Reply(keyboard) => &keyboard.rows,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn titles(names: &[&str]) -> Vec<String> {
        names.iter().map(|name| name.to_string()).collect()
    }

    #[test]
    fn test_styles_keyboard_layouts() {
        let cases: Vec<(Vec<String>, Vec<Vec<&str>>)> = vec![
            (
                titles(&["Style1", "Style2", "Style3"]),
                vec![vec!["Style1", "Style2"], vec!["Style3"]],
            ),
            (titles(&["A", "B"]), vec![vec!["A", "B"]]),
            (titles(&["Single"]), vec![vec!["Single"]]),
            (Vec::new(), Vec::new()),
        ];

        for (styles, expected) in cases {
            let keyboard = Keyboard::styles(&styles);
            let Keyboard::Reply(reply) = &keyboard else {
                panic!("expected reply keyboard");
            };
            assert!(reply.resize);
            assert_eq!(keyboard.rows(), expected.as_slice());
        }
    }

    #[test]
    fn test_start_keyboard() {
        let keyboard = Keyboard::start();
        let Keyboard::Reply(reply) = &keyboard else {
            panic!("expected reply keyboard");
        };

        assert!(reply.resize);
        assert!(reply.one_time);
        assert_eq!(
            reply.rows,
            vec![
                vec!["Choose image style".to_string(), "Enter prompt".to_string()],
                vec!["Help".to_string()],
            ]
        );
    }

    #[test]
    fn test_remove_keyboard_has_no_rows() {
        assert!(Keyboard::Remove.rows().is_empty());
    }
}
