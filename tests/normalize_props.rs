// tests/normalize_props.rs
//
// Property-style checks over deterministic pseudo-random headlines.

use tatvai_backend::cluster::similarity;
use tatvai_backend::normalize::normalize;

/// Tiny deterministic LCG so runs are reproducible without extra crates.
struct Lcg(u64);

impl Lcg {
    fn next_usize(&mut self, n: usize) -> usize {
        self.0 = self.0.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
        ((self.0 >> 33) as usize) % n
    }
}

const PIECES: &[&str] = &[
    "PM", "announces", "policy", "Rain", "in", "Delhi", "—", "!!", "  ", "\t", "3.5%", "“quoted”",
    "Election", "results:", "दिल्ली", "Ünïcödé", "_", "\n", "...", "O'Brien", "covid-19",
];

fn headline(rng: &mut Lcg) -> String {
    let n = 1 + rng.next_usize(8);
    (0..n)
        .map(|_| PIECES[rng.next_usize(PIECES.len())])
        .collect::<Vec<_>>()
        .join(if rng.next_usize(2) == 0 { " " } else { "" })
}

#[test]
fn normalize_is_idempotent() {
    let mut rng = Lcg(7);
    for _ in 0..500 {
        let h = headline(&mut rng);
        let once = normalize(&h);
        assert_eq!(normalize(&once), once, "input {h:?}");
    }
}

#[test]
fn normalized_keys_have_no_edge_or_double_spaces() {
    let mut rng = Lcg(11);
    for _ in 0..500 {
        let k = normalize(&headline(&mut rng));
        assert_eq!(k.trim(), k);
        assert!(!k.contains("  "), "double space in {k:?}");
        assert_eq!(k.to_lowercase(), k);
    }
}

#[test]
fn similarity_is_symmetric_and_bounded() {
    let mut rng = Lcg(23);
    for _ in 0..300 {
        let a = normalize(&headline(&mut rng));
        let b = normalize(&headline(&mut rng));
        let ab = similarity(&a, &b);
        assert_eq!(ab, similarity(&b, &a), "{a:?} vs {b:?}");
        assert!((0.0..=1.0).contains(&ab));
    }
}

#[test]
fn identical_keys_score_one() {
    let mut rng = Lcg(31);
    for _ in 0..200 {
        let h = headline(&mut rng);
        let k = normalize(&h);
        assert_eq!(similarity(&k, &normalize(&h.to_uppercase().to_lowercase())), 1.0);
    }
}

/// Swap every ASCII char for a two-byte one; a bijection on the test alphabet.
fn widen(key: &str) -> String {
    key.chars()
        .map(|c| {
            if c.is_ascii() && !c.is_whitespace() {
                char::from_u32(0x0100 + c as u32).unwrap()
            } else {
                c
            }
        })
        .collect()
}

#[test]
fn similarity_ignores_byte_width() {
    let mut rng = Lcg(43);
    for _ in 0..300 {
        let a = normalize(&headline(&mut rng));
        let b = normalize(&headline(&mut rng));
        let narrow = similarity(&a, &b);
        let wide = similarity(&widen(&a), &widen(&b));
        assert!((narrow - wide).abs() < 1e-12, "{a:?} vs {b:?}: {narrow} vs {wide}");
    }
}

#[test]
fn non_latin_near_duplicates_clear_threshold() {
    let pairs = [
        ("दिल्ली में भारी बारिश", "दिल्ली में बारिश"),
        ("Ünïcödé headline today", "Ünïcödé headline"),
    ];
    for (a, b) in pairs {
        let s = similarity(&normalize(a), &normalize(b));
        assert!(s >= 0.55, "{a:?} vs {b:?} scored {s}");
    }
}
