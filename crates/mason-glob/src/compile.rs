//! Filespec-to-regex compilation.
//!
//! Translates a split filespec into a single anchored, case-insensitive
//! regex with named capture groups `FIXEDDIR`, `WILDCARDDIR` and `FILENAME`.
//! The compiler works on a token stream rather than on text, so reductions
//! can never collide with pattern characters in user input:
//!
//! 1. tokenize each part (separators unified, UNC prefix preserved);
//! 2. apply the trailing-dot filename rules;
//! 3. reduce identity redundancies (`/./`, `//`, trailing `/.`) to a fixed
//!    point;
//! 4. collapse `**/**` into `**` and materialize the recursion operators
//!    (`**/` at the head of the wildcard part, `/**/` inside it);
//! 5. reject any `**` left anywhere else;
//! 6. rewrite the remaining wildcards and emit the regex.

use crate::paths::is_separator;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Tok {
    Lit(char),
    /// A directory separator (either slash flavor).
    Sep,
    /// The leading `\\` of a UNC fixed directory.
    Unc,
    Star,
    Question,
    /// `*` in a trailing-dot filename: any run of non-dot characters.
    StarNoDot,
    /// `?` in a trailing-dot filename: one non-dot character.
    QuestionNoDot,
    /// Materialized `*`: any run of non-separator characters.
    AnyNonSep,
    /// Materialized `?`.
    AnyChar,
    /// `**/` at the start of the wildcard part: any directory prefix or
    /// nothing at all.
    LeftDirs,
    /// `/**/` inside the wildcard part: one separator, optionally followed
    /// by further directories.
    MiddleDirs,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Part {
    Fixed,
    Wildcard,
    Filename,
}

#[derive(Debug, Clone, Copy)]
struct Piece {
    tok: Tok,
    part: Part,
}

/// Compile the three parts of a split filespec into regex text, or `None`
/// when the filespec is structurally illegal (`..` after a wildcard, or a
/// `**` that is not a whole directory segment).
pub(crate) fn regular_expression_from_parts(
    fixed_dir: &str,
    wildcard_dir: &str,
    filename: &str,
) -> Option<String> {
    // Directory wildcards must never be able to climb back out.
    if wildcard_dir.contains("..") {
        return None;
    }

    let mut pieces = Vec::with_capacity(fixed_dir.len() + wildcard_dir.len() + filename.len());
    tokenize(fixed_dir, Part::Fixed, false, &mut pieces);
    mark_unc_prefix(&mut pieces);
    tokenize(wildcard_dir, Part::Wildcard, false, &mut pieces);
    let trailing_dot = filename.ends_with('.');
    tokenize(filename, Part::Filename, trailing_dot, &mut pieces);
    if trailing_dot {
        // `foo.` means `foo`: the dot itself is dropped, and the wildcard
        // replacements above already refuse to match a dot.
        pieces.pop();
    }

    reduce_identities(&mut pieces);
    collapse_double_recursion(&mut pieces);
    materialize_left_dirs(&mut pieces);
    materialize_middle_dirs(&mut pieces);

    // Any `**` still standing is not a whole segment.
    if pieces.windows(2).any(|w| w[0].tok == Tok::Star && w[1].tok == Tok::Star) {
        return None;
    }

    materialize_wildcards(&mut pieces);
    Some(emit(&pieces))
}

fn tokenize(s: &str, part: Part, trailing_dot: bool, out: &mut Vec<Piece>) {
    for c in s.chars() {
        let tok = match c {
            c if is_separator(c) => Tok::Sep,
            '*' if trailing_dot => Tok::StarNoDot,
            '?' if trailing_dot => Tok::QuestionNoDot,
            '*' => Tok::Star,
            '?' => Tok::Question,
            other => Tok::Lit(other),
        };
        out.push(Piece { tok, part });
    }
}

/// Fold the two leading separators of a UNC fixed directory into one token
/// so separator collapsing leaves them alone.
fn mark_unc_prefix(pieces: &mut Vec<Piece>) {
    if pieces.len() >= 2 && pieces[0].tok == Tok::Sep && pieces[1].tok == Tok::Sep {
        pieces.remove(1);
        pieces[0].tok = Tok::Unc;
    }
}

fn tok_at(pieces: &[Piece], i: usize) -> Option<Tok> {
    pieces.get(i).map(|p| p.tok)
}

/// Reduce `//`, `/./`, a leading `./.` and a trailing `/.` until nothing
/// changes. These are all spelling variations of the same path.
fn reduce_identities(pieces: &mut Vec<Piece>) {
    loop {
        let mut changed = false;

        let mut i = 0;
        while i + 1 < pieces.len() {
            if pieces[i].tok == Tok::Sep && pieces[i + 1].tok == Tok::Sep {
                pieces.remove(i + 1);
                changed = true;
                continue;
            }
            if pieces[i].tok == Tok::Sep
                && tok_at(pieces, i + 1) == Some(Tok::Lit('.'))
                && tok_at(pieces, i + 2) == Some(Tok::Sep)
            {
                pieces.drain(i + 1..i + 3);
                changed = true;
                continue;
            }
            i += 1;
        }

        if tok_at(pieces, 0) == Some(Tok::Lit('.'))
            && tok_at(pieces, 1) == Some(Tok::Sep)
            && tok_at(pieces, 2) == Some(Tok::Lit('.'))
            && (pieces.len() == 3 || tok_at(pieces, 3) == Some(Tok::Sep))
        {
            pieces.drain(1..3);
            changed = true;
        }

        let n = pieces.len();
        if n >= 2
            && pieces[n - 2].tok == Tok::Sep
            && pieces[n - 1].tok == Tok::Lit('.')
        {
            pieces.truncate(n - 2);
            changed = true;
        }

        if !changed {
            break;
        }
    }
}

/// `**/**` asks for the same thing twice; collapse to `**`.
fn collapse_double_recursion(pieces: &mut Vec<Piece>) {
    let target = [Tok::Star, Tok::Star, Tok::Sep, Tok::Star, Tok::Star];
    loop {
        let found = pieces.windows(5).position(|w| {
            w.iter().map(|p| p.tok).eq(target.iter().copied())
                && w.iter().all(|p| p.part == Part::Wildcard)
        });
        match found {
            Some(i) => {
                pieces.drain(i + 2..i + 5);
            }
            None => break,
        }
    }
}

/// `**/` at the head of the wildcard part: any chain of directories, or
/// nothing.
fn materialize_left_dirs(pieces: &mut Vec<Piece>) {
    let start = pieces.iter().position(|p| p.part == Part::Wildcard);
    if let Some(i) = start {
        if tok_at(pieces, i) == Some(Tok::Star)
            && tok_at(pieces, i + 1) == Some(Tok::Star)
            && tok_at(pieces, i + 2) == Some(Tok::Sep)
            && pieces[i + 1].part == Part::Wildcard
            && pieces[i + 2].part == Part::Wildcard
        {
            pieces.drain(i + 1..i + 3);
            pieces[i].tok = Tok::LeftDirs;
        }
    }
}

/// `/**/` inside the wildcard part: one separator plus optional further
/// directories.
fn materialize_middle_dirs(pieces: &mut Vec<Piece>) {
    let target = [Tok::Sep, Tok::Star, Tok::Star, Tok::Sep];
    let mut i = 0;
    while i + 3 < pieces.len() {
        let window = &pieces[i..i + 4];
        if window.iter().map(|p| p.tok).eq(target.iter().copied())
            && window.iter().all(|p| p.part == Part::Wildcard)
        {
            pieces.drain(i + 1..i + 4);
            pieces[i].tok = Tok::MiddleDirs;
        }
        i += 1;
    }
}

/// Rewrite the remaining single-segment wildcards. `*.*` is the legacy
/// platform's all-files spelling and means plain `*`.
fn materialize_wildcards(pieces: &mut Vec<Piece>) {
    loop {
        let found = pieces.windows(3).position(|w| {
            w[0].tok == Tok::Star && w[1].tok == Tok::Lit('.') && w[2].tok == Tok::Star
        });
        match found {
            Some(i) => {
                pieces.drain(i + 1..i + 3);
                pieces[i].tok = Tok::AnyNonSep;
            }
            None => break,
        }
    }
    for piece in pieces.iter_mut() {
        piece.tok = match piece.tok {
            Tok::Star => Tok::AnyNonSep,
            Tok::Question => Tok::AnyChar,
            other => other,
        };
    }
}

fn emit(pieces: &[Piece]) -> String {
    let mut fixed = String::new();
    let mut wildcard = String::new();
    let mut filename = String::new();

    for piece in pieces {
        let buf = match piece.part {
            Part::Fixed => &mut fixed,
            Part::Wildcard => &mut wildcard,
            Part::Filename => &mut filename,
        };
        match piece.tok {
            Tok::Lit(c) => push_escaped(c, buf),
            Tok::Sep => buf.push_str(r"[/\\]+"),
            Tok::Unc => buf.push_str(r"\\\\"),
            Tok::AnyNonSep => buf.push_str(r"[^/\\]*"),
            Tok::AnyChar => buf.push('.'),
            Tok::StarNoDot => buf.push_str(r"[^/\\.]*"),
            Tok::QuestionNoDot => buf.push_str(r"[^/\\.]"),
            Tok::LeftDirs => buf.push_str(r"((.*[/\\]+)?)"),
            Tok::MiddleDirs => buf.push_str(r"([/\\]+(.*[/\\]+)?)"),
            Tok::Star | Tok::Question => unreachable!("wildcards are materialized before emit"),
        }
    }

    format!("(?i)^(?P<FIXEDDIR>{fixed})(?P<WILDCARDDIR>{wildcard})(?P<FILENAME>{filename})$")
}

fn push_escaped(c: char, out: &mut String) {
    if matches!(
        c,
        '\\' | '.' | '+' | '*' | '?' | '(' | ')' | '|' | '[' | ']' | '{' | '}' | '^' | '$' | '#' | '-' | '&' | '~'
    ) {
        out.push('\\');
    }
    out.push(c);
}
