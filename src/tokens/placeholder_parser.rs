// Copyright (c) Chris Gunn.
// Licensed under the MIT license.

use chumsky::prelude::*;

pub struct PlaceholderParser {
    parser: Box<dyn Parser<char, Vec<String>, Error = Simple<char>> + Send + Sync>,
}

impl PlaceholderParser {
    pub fn new() -> PlaceholderParser {
        let parser = gen_placeholder_scanner();
        PlaceholderParser {
            parser: Box::new(parser),
        }
    }

    /// Returns the names of all `__NAME__` markers in `text`, in order of appearance.
    pub fn scan(&self, text: &str) -> Vec<String> {
        // Every character is accepted by the fallback branch, so the scan cannot fail.
        self.parser.parse(text).unwrap_or_default()
    }
}

// NAME is one or more words of [A-Za-z0-9.-] joined by single underscores.
fn gen_placeholder_scanner() -> impl Parser<char, Vec<String>, Error = Simple<char>> {
    let word = filter(|c: &char| c.is_ascii_alphanumeric() || *c == '-' || *c == '.')
        .repeated()
        .at_least(1)
        .collect::<String>();

    let name = word
        .clone()
        .then(just('_').ignore_then(word).repeated())
        .map(|(first, rest)| {
            let mut name = first;
            for part in rest {
                name.push('_');
                name.push_str(&part);
            }
            name
        });

    let placeholder = just("__").ignore_then(name).then_ignore(just("__"));

    placeholder
        .map(Some)
        .or(any().to(None))
        .repeated()
        .then_ignore(end())
        .map(|names| names.into_iter().flatten().collect())
}
