#[cfg(test)]
use crate::compile;

#[cfg(test)]
fn run(code: &str) -> String {
    match compile(code) {
        Ok(program) => program.to_string(),
        Err(diagnostic) => diagnostic.to_string(),
    }
}

#[test]
fn game_loop() {
    insta::assert_snapshot!(run(r#"
        (init
          (set x 0)
          (set speed 2.5))
        (update
          (if (key-down @right) (set x (+ x speed)))
          (if (key-down @left) (set x (- x speed))))
        (draw
          (clear)
          (draw-text "x = " 10 10)
          (draw-rect x 40 8 8))
    "#), @r#"
    (init (set x 0) (set speed 2.5))
    (update (if (key-down (key 1073741903)) (set x (+ x speed))) (if (key-down (key 1073741904)) (set x (- x speed))))
    (draw (clear) (draw-text "x = " 10 10) (draw-rect x 40 8 8))
    "#)
}

#[test]
fn set_in_init() {
    insta::assert_snapshot!(run("(init (set x 5))"), @"(init (set x 5))")
}

#[test]
fn handlers_print_in_slot_order() {
    insta::assert_snapshot!(run("(draw) (update (step \"a\\tb\")) (init)"), @r#"
    (init)
    (update (step "a\tb"))
    (draw)
    "#)
}

#[test]
fn missing_list_terminator() {
    insta::assert_snapshot!(run("(init (set x 5)"), @"1:1-1:16: expected list terminator")
}

#[test]
fn set_at_top_level() {
    insta::assert_snapshot!(run("(set x 5)"), @"1:1-1:10: top-level expression must be an init, update, or draw declaration")
}

#[test]
fn duplicate_init() {
    insta::assert_snapshot!(run("(init)(init)"), @"1:7-1:13: duplicate init declaration")
}

#[test]
fn if_missing_condition() {
    insta::assert_snapshot!(run("(init (if))"), @"1:7-1:11: if missing condition")
}

#[test]
fn unknown_key() {
    insta::assert_snapshot!(run("(init (set x @unknownkey))"), @"1:14-1:25: unknown key name @unknownkey; did you mean @down or @kpenter?")
}

#[test]
fn unterminated_string() {
    insta::assert_snapshot!(run("(draw (text \"hi))"), @"1:13-1:18: unterminated string")
}

#[test]
fn invalid_escape() {
    insta::assert_snapshot!(run(r#"(draw (text "a\e"))"#), @r"1:13-1:17: invalid escape sequence \e")
}
