//! End-to-end card cases with exact expected output.

use flashcard_cleaner::transform;
use pretty_assertions::assert_eq;

const G: &str = r#"<span style="color: rgb(194, 194, 194)">"#;
const LEGACY: &str = r#"<span style="color: #C2C2C2">"#;

struct Case {
    name: &'static str,
    front: &'static str,
    back: String,
    expected_front: &'static str,
    expected_back: String,
}

fn cases() -> Vec<Case> {
    vec![
        Case {
            name: "verb with several definitions and t.ex. clauses",
            front: "Att försaka",
            back: "1. Vara utan<br>(t.ex. \"Vi fick försaka en hel del när vi köpte huset\")<br><br>2. To renounce, to forsake, to give up<br>(t.ex. \"Hon beslöt att försaka sitt arv.\"<br>\"De försaker alla världsliga ting.\"<br>\"Du har försakat familjen.\"<br><br>(syn: strunta i)".to_string(),
            expected_front: "Att försaka (2)",
            expected_back: format!(
                "1. Vara utan<br>{G}\"Vi fick <i>försaka</i> en hel del när vi köpte huset\"</span><br><br>2. To renounce, to forsake, to give up<br>{G}\"Hon beslöt att <i>försaka</i> sitt arv.\"</span><br>{G}\"De <i>försaker</i> alla världsliga ting.\"</span><br>{G}\"Du har <i>försakat</i> familjen.\"</span><br><br>{G}(syn: strunta i)</span>"
            ),
        },
        Case {
            name: "canonical card with sense note",
            front: "En stubin",
            back: format!("A fuse<br>{G}\"Alex hade kort <i>stubin</i>, ett brustet hjärta, och en ladda pistol.\"<br>(på stubinen: omedelbart)<br>(syn: stubintråd)</span>"),
            expected_front: "En stubin",
            expected_back: format!("A fuse<br>{G}\"Alex hade kort <i>stubin</i>, ett brustet hjärta, och en ladda pistol.\"<br>(på stubinen: omedelbart)<br>(syn: stubintråd)</span>"),
        },
        Case {
            name: "legacy gray is rewritten",
            front: "En stubin",
            back: format!("A fuse<br>{LEGACY}\"Alex hade kort <i>stubin</i>.\"<br>(syn: stubintråd)</span>"),
            expected_front: "En stubin",
            expected_back: format!("A fuse<br>{G}\"Alex hade kort <i>stubin</i>.\"<br>(syn: stubintråd)</span>"),
        },
        Case {
            name: "or separators with t.ex. inside spans",
            front: "En stam",
            back: format!(
                "Trunk (of a tree)<br>{LEGACY}t.ex. \"Trädet hade en tjock <i>stam</i>.\"</span><br>Or, Tribe<br>{LEGACY}\"En stam av nomader reste genom öknen.\", \"Den Svenska Björnstammen\"</span><br>Or, Del av ord, där böjningsaffix tagits bort<br>{LEGACY}(ordstam, rot)</span><br>Or, Strain (of bacteria, virus)<br>{LEGACY}\"Forskarna studerade en ny stam av viruset.\"<br><br>(best: stammen, pl: stammar)</span>"
            ),
            expected_front: "En stam (4)",
            expected_back: format!(
                "1. Trunk (of a tree)<br>{G}\"Trädet hade en tjock <i>stam</i>.\"</span><br><br>2. Tribe<br>{G}\"En <i>stam</i> av nomader reste genom öknen.\"<br>\"Den Svenska Björnstammen\"</span><br><br>3. Del av ord, där böjningsaffix tagits bort<br>{G}(ordstam, rot)</span><br><br>4. Strain (of bacteria, virus)<br>{G}\"Forskarna studerade en ny <i>stam</i> av viruset.\"</span><br><br>{G}(best: <i>stammen</i>, pl: <i>stammar</i>)</span>"
            ),
        },
        Case {
            name: "or separators with bare t.ex. line",
            front: "En stam",
            back: "Trunk (of a tree)<br>t.ex. \"Trädet hade en tjock stam.\"<br>Or, Tribe<br>\"En stam av nomader...\"".to_string(),
            expected_front: "En stam (2)",
            expected_back: format!(
                "1. Trunk (of a tree)<br>{G}\"Trädet hade en tjock <i>stam</i>.\"</span><br><br>2. Tribe<br>{G}\"En <i>stam</i> av nomader...\"</span>"
            ),
        },
        Case {
            name: "t.ex. in parentheses with a gloss note",
            front: "En själ [sound:pronunciation_sv_själ.mp3]",
            back: "A soul (t.ex. \"Kärnan i människans <i>själ</i> föds ur nya upplevelser.\")<br>(en säl: a seal)".to_string(),
            expected_front: "En själ [sound:pronunciation_sv_själ.mp3]",
            expected_back: format!(
                "A soul<br>{G}\"Kärnan i människans <i>själ</i> föds ur nya upplevelser.\"<br>(en säl: a seal)</span>"
            ),
        },
        Case {
            name: "entities and non-breaking spaces",
            front: "Test card",
            back: "Definition&nbsp;here&nbsp;&nbsp;&gt; more text<br>\"Example&nbsp;sentence.\"<br>(syn: word)".to_string(),
            expected_front: "Test card",
            expected_back: format!(
                "Definition here  > more text<br>{G}\"Example sentence.\"</span><br>{G}(syn: word)</span>"
            ),
        },
        Case {
            name: "english gloss is not italicized",
            front: "Att glida",
            back: "To slide / glide<br>\"Jag gled på isen.\"".to_string(),
            expected_front: "Att glida",
            expected_back: format!("To slide / glide<br>{G}\"Jag gled på isen.\"</span>"),
        },
        Case {
            name: "usage note stays in the example span",
            front: "Belåten",
            back: "Content / pleased<br>\"självbelåten\": smug<br>Ordet används främst i uttryck såsom \"nöjd och belåten\" och \"mätt och belåten\".".to_string(),
            expected_front: "Belåten",
            expected_back: format!(
                "Content / pleased<br>{G}\"självbelåten\": smug<br>Ordet används främst i uttryck såsom \"nöjd och <i>belåten</i>\" och \"mätt och <i>belåten</i>\".</span>"
            ),
        },
        Case {
            name: "parenthesized quote group",
            front: "För övrigt",
            back: "Furthermore / also (i förbi\u{00AD}gående sagt) (\"Landet bör <i>för övrigt </i>stärka skyddet för dess minoritetsbefolkningar.\",<br>\"Liknande skillnader kan <i>för övrigt</i> observeras även för andra avfallstyper\")".to_string(),
            expected_front: "För övrigt",
            expected_back: format!(
                "Furthermore / also (i förbi gående sagt)<br>{G}\"Landet bör <i>för övrigt </i>stärka skyddet för dess minoritetsbefolkningar.\"<br>\"Liknande skillnader kan <i>för övrigt</i> observeras även för andra avfallstyper\"</span>"
            ),
        },
        Case {
            name: "verb used as a noun is not italicized",
            front: "Att bölja",
            back: "To billow<br>\"En bölja reste sig.\"<br>\"Vågorna började bölja.\"".to_string(),
            expected_front: "Att bölja",
            expected_back: format!(
                "To billow<br>{G}\"En bölja reste sig.\"</span><br>{G}\"Vågorna började <i>bölja</i>.\"</span>"
            ),
        },
        Case {
            name: "rgb gray with trailing separator",
            front: "RGB test",
            back: r#"Main definition<br><span style="color: rgb(194, 194, 194);">"Example sentence"</span>"#.to_string(),
            expected_front: "RGB test",
            expected_back: format!("Main definition<br>{G}\"Example sentence\"</span>"),
        },
        Case {
            name: "span after a leading break is not split",
            front: "Utan skor",
            back: format!("<br>{G}\"Han gick till jobbet <i>i strumplästen</i>.\"<br><br>(en läst: a shoe mold)</span>"),
            expected_front: "Utan skor",
            expected_back: format!("<br>{G}\"Han gick till jobbet <i>i strumplästen</i>.\"<br><br>(en läst: a shoe mold)</span>"),
        },
        Case {
            name: "adjective inflections",
            front: "Mogen",
            back: "1. Mature<br>(t.ex. \"Det var ett moget beslut\")<br><br>2. Ripe<br>(t.ex. \"Mogna tomater\")".to_string(),
            expected_front: "Mogen (2)",
            expected_back: format!(
                "1. Mature<br>{G}\"Det var ett <i>moget</i> beslut\"</span><br><br>2. Ripe<br>{G}\"<i>Mogna</i> tomater\"</span>"
            ),
        },
        Case {
            name: "stale count is replaced",
            front: "En stam (3)",
            back: "1. Trunk<br><br>2. Tribe".to_string(),
            expected_front: "En stam (2)",
            expected_back: "1. Trunk<br><br>2. Tribe".to_string(),
        },
        Case {
            name: "quoted text before a parenthesized quote",
            front: "Kliv",
            back: "Def<br>\"a\" (\"b\")".to_string(),
            expected_front: "Kliv",
            expected_back: format!("Def<br>{G}\"a\"</span><br>{G}\"b\"</span>"),
        },
        Case {
            name: "note before an inline example",
            front: "Kliv",
            back: "(syn: bana) (t.ex. \"a\")".to_string(),
            expected_front: "Kliv",
            expected_back: format!("{G}(syn: bana)</span><br>{G}\"a\"</span>"),
        },
        Case {
            name: "gray background is not a muted span",
            front: "En stam",
            back: "Def<br><span style=\"background-color: #c2c2c2\">\"en stam\"<br><br>(syn: x)</span>"
                .to_string(),
            expected_front: "En stam",
            expected_back:
                "Def<br><span style=\"background-color: #c2c2c2\">\"en stam\"<br><br>(syn: x)</span>"
                    .to_string(),
        },
        Case {
            name: "whitespace-only back",
            front: "Kliv",
            back: "   ".to_string(),
            expected_front: "Kliv",
            expected_back: String::new(),
        },
    ]
}

#[test]
fn cards_transform_to_expected_output() {
    for case in cases() {
        let result = transform(case.front, &case.back);
        assert_eq!(result.front, case.expected_front, "front of {}", case.name);
        assert_eq!(result.back, case.expected_back, "back of {}", case.name);

        let expected_changed = case.front != case.expected_front || case.back != case.expected_back;
        assert_eq!(result.changed, expected_changed, "changed flag of {}", case.name);
    }
}

#[test]
fn transform_is_idempotent() {
    let mut inputs: Vec<(String, String)> = cases()
        .into_iter()
        .map(|case| (case.front.to_string(), case.back))
        .collect();
    inputs.extend([
        ("".to_string(), "".to_string()),
        ("Ord".to_string(), "&amp;amp;lt;b&amp;gt;".to_string()),
        ("En stam".to_string(), "Trunk<br>\"<i>stam <span>x\"".to_string()),
        (
            "Att gå".to_string(),
            "Walk<br>\"Vi går\", \"Han gick\"<br>(t.ex. \"Gå!\"<br>(syn: vandra)".to_string(),
        ),
        (
            "Solen".to_string(),
            "Sun<br>\"Solen sken över sjön.\"<br>\"Hela sjön glittrade.\"".to_string(),
        ),
        (
            "Ett ord".to_string(),
            format!("Word<br>{G}\"a\"<br><br>(b)<br><br>(c)</span>"),
        ),
        ("X".to_string(), "Def<br>\"a\" (\"b\")".to_string()),
        ("X".to_string(), "(syn: x) (t.ex. \"a\")".to_string()),
        ("X".to_string(), "Def<br>(syn: y) (\"b\")".to_string()),
        ("X".to_string(), "\"quoted def\" (t.ex. \"a\")".to_string()),
        ("X".to_string(), "   ".to_string()),
        (
            "En stam".to_string(),
            "Def<br><span style=\"background-color: #c2c2c2\">\"en stam\"<br><br>(syn: x)</span>"
                .to_string(),
        ),
    ]);

    for (front, back) in inputs {
        let once = transform(&front, &back);
        let twice = transform(&once.front, &once.back);
        assert_eq!(
            (twice.front.as_str(), twice.back.as_str()),
            (once.front.as_str(), once.back.as_str()),
            "second pass over {front:?}"
        );
        assert!(!twice.changed, "second pass over {front:?} reported a change");
    }
}

/// Fails when an `<i>` opens while another is still open.
fn assert_no_nested_emphasis(html: &str) {
    let mut depth = 0usize;
    let mut rest = html;
    while let Some(at) = rest.find('<') {
        let tag_end = rest[at..].find('>').map_or(rest.len(), |end| at + end + 1);
        let tag = rest[at..tag_end].to_ascii_lowercase();
        if tag == "<i>" {
            assert_eq!(depth, 0, "nested emphasis in {html}");
            depth += 1;
        } else if tag == "</i>" {
            depth = depth.saturating_sub(1);
        }
        rest = &rest[tag_end..];
    }
}

#[test]
fn output_never_nests_emphasis() {
    for case in cases() {
        assert_no_nested_emphasis(&transform(case.front, &case.back).back);
    }
    let result = transform("Att försaka", "Give up<br>\"De <i>försaker</i> allt, försaka mer\"");
    assert_no_nested_emphasis(&result.back);
    assert!(result.back.contains("<i>försaker</i>"));
    assert!(result.back.contains("<i>försaka</i> mer"));
}

#[test]
fn verbs_are_never_italicized_in_definitions() {
    let result = transform("Att försaka", "To försaka something<br>\"Att försaka allt.\"");
    assert_eq!(
        result.back,
        format!("To försaka something<br>{G}\"Att <i>försaka</i> allt.\"</span>")
    );
}

#[test]
fn repeated_quoted_word_is_italicized() {
    let result = transform(
        "En glans",
        "Shine<br>\"Solen sken över sjön.\"<br>\"Hela sjön glittrade i solen.\"",
    );
    assert_eq!(
        result.back,
        format!(
            "Shine<br>{G}\"<i>Solen</i> sken över sjön.\"</span><br>{G}\"Hela sjön glittrade i <i>solen</i>.\"</span>"
        )
    );
}
