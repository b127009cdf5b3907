// tests/selector_synthetic.rs
// Seeded random batches checked against the selection rules.

use chrono::{DateTime, TimeZone, Utc};
use insta_relay::{select_new_posts, Post};
use rand::{rngs::StdRng, Rng, SeedableRng};

fn ts(secs: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(secs, 0).unwrap()
}

fn random_batch(rng: &mut StdRng) -> Vec<Post> {
    let n = rng.random_range(0..20);
    (0..n)
        .map(|i| Post {
            id: format!("{i}"),
            url: format!("https://www.instagram.com/p/{i}/"),
            // roughly one in ten records comes back without a timestamp
            created_at: if rng.random_range(0..10) == 0 {
                None
            } else {
                Some(ts(rng.random_range(0..1_000)))
            },
            image_url: None,
            caption: None,
            comments: vec![],
        })
        .collect()
}

#[test]
fn selection_rules_hold_for_random_batches() {
    let mut rng = StdRng::seed_from_u64(42);

    for _ in 0..500 {
        let batch = random_batch(&mut rng);
        let wm = ts(rng.random_range(0..1_000));
        let sel = select_new_posts(&batch, wm);

        // only strictly newer posts
        assert!(sel.new_posts.iter().all(|p| p.created_at.unwrap() > wm));

        // nothing newer is left behind
        let expected: Vec<&str> = batch
            .iter()
            .filter(|p| p.created_at.is_some_and(|t| t > wm))
            .map(|p| p.id.as_str())
            .collect();
        let got: Vec<&str> = sel.new_posts.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(got, expected, "input order must be preserved");

        // monotonic candidate
        match sel.watermark {
            Some(w) => {
                assert!(w >= wm);
                let max = batch.iter().filter_map(|p| p.created_at).max().unwrap();
                assert_eq!(w, max.max(wm));
            }
            None => assert!(batch.iter().all(|p| p.created_at.is_none())),
        }

        // pure
        assert_eq!(select_new_posts(&batch, wm), sel);
    }
}

#[test]
fn reapplying_the_candidate_selects_nothing() {
    let mut rng = StdRng::seed_from_u64(7);
    for _ in 0..200 {
        let batch = random_batch(&mut rng);
        let first = select_new_posts(&batch, ts(0));
        let next = first.next_watermark(ts(0));
        assert!(select_new_posts(&batch, next).new_posts.is_empty());
    }
}
