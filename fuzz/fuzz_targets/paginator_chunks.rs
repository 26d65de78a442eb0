#![no_main]

use std::collections::BTreeMap;

use ferry_paginate::{Paginator, MIN_PAGE_LEN, PAGE_PLACEHOLDER};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Some((&[len_seed, chunk_seed], rest)) = data.split_first_chunk::<2>() else {
        return;
    };
    let max_page_len = MIN_PAGE_LEN + usize::from(len_seed);
    let chunk_chars = usize::from(chunk_seed).max(1);
    let text = String::from_utf8_lossy(rest);

    let mut paginator = Paginator::new(max_page_len);
    let mut pages = BTreeMap::new();
    let chars = text.chars().collect::<Vec<_>>();
    for chunk in chars.chunks(chunk_chars) {
        let chunk = chunk.iter().collect::<String>();
        for event in paginator.push(&chunk) {
            let page = event.into_page();
            assert!(page.content.chars().count() <= max_page_len);
            assert!(!page.content.is_empty());
            pages.insert(page.index, page);
        }
    }
    if let Some(event) = paginator.finish("fuzz://stream") {
        assert!(text.is_empty());
        assert!(event.page().is_final);
        return;
    }

    let rebuilt = pages
        .into_values()
        .map(|page| {
            if page.is_placeholder {
                assert_eq!(page.content, PAGE_PLACEHOLDER);
                String::new()
            } else {
                page.content
            }
        })
        .collect::<String>();
    // Placeholder pages stand in for whitespace-only text.
    let visible = |value: &str| {
        value
            .chars()
            .filter(|ch| !ch.is_whitespace())
            .collect::<String>()
    };
    assert_eq!(visible(&rebuilt), visible(&text));
});
