// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Word-to-line and word-to-paragraph grouping for engines that report
// individual words with their position in the page hierarchy.

use std::collections::HashMap;

use folio_core::Region;

use super::RawRecognition;

/// One recognized word and where it sits in the page structure.
#[derive(Debug, Clone, PartialEq)]
pub struct WordBox {
    pub block: i32,
    pub paragraph: i32,
    pub line: i32,
    pub left: i32,
    pub top: i32,
    pub width: i32,
    pub height: i32,
    /// Confidence on a [0, 1] scale.
    pub confidence: f32,
    pub text: String,
}

impl WordBox {
    fn region(&self) -> Region {
        Region::Rect {
            left: self.left,
            top: self.top,
            width: self.width.max(0) as u32,
            height: self.height.max(0) as u32,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct GroupKey {
    block: i32,
    paragraph: i32,
    /// `None` when grouping whole paragraphs.
    line: Option<i32>,
}

#[derive(Default)]
struct Group {
    lines: Vec<(i32, Vec<String>)>,
    region: Region,
    confidence_sum: f32,
    words: usize,
}

/// Group words into line fragments, or paragraph fragments when
/// `by_paragraph` is set.
///
/// Groups appear in the order their first word appears, which is the engine's
/// reading order. Words within a line are joined by a space; lines within a
/// paragraph by a newline. A group's region is the union of its word boxes
/// and its confidence the mean of its word confidences. Blank words are
/// ignored.
pub fn group_words<I>(words: I, by_paragraph: bool) -> Vec<RawRecognition>
where
    I: IntoIterator<Item = WordBox>,
{
    let mut order: Vec<GroupKey> = Vec::new();
    let mut groups: HashMap<GroupKey, Group> = HashMap::new();

    for word in words {
        let text = word.text.trim();
        if text.is_empty() {
            continue;
        }
        let key = GroupKey {
            block: word.block,
            paragraph: word.paragraph,
            line: (!by_paragraph).then_some(word.line),
        };
        let group = groups.entry(key).or_insert_with(|| {
            order.push(key);
            Group::default()
        });

        match group.lines.last_mut() {
            Some((line, parts)) if *line == word.line => parts.push(text.to_string()),
            _ => group.lines.push((word.line, vec![text.to_string()])),
        }
        group.region = group.region.union(&word.region());
        group.confidence_sum += word.confidence;
        group.words += 1;
    }

    order
        .into_iter()
        .filter_map(|key| groups.remove(&key))
        .map(|group| {
            let text = group
                .lines
                .iter()
                .map(|(_, parts)| parts.join(" "))
                .collect::<Vec<_>>()
                .join("\n");
            RawRecognition::Detailed {
                region: group.region,
                text,
                confidence: Some(group.confidence_sum / group.words as f32),
            }
        })
        .collect()
}
