//! End-to-end board behavior: clicks, reveals, resize transitions and
//! session flags, driven with explicit timestamps.

use std::time::{Duration, Instant};

use advice_board::board::Board;
use advice_board::config::BoardConfig;
use advice_board::fit::{BoxSize, FitOutcome};
use advice_board::measure::HeuristicMeasurer;
use advice_board::session::{BoxId, SessionFlags};
use advice_board::state_machine::card_sm::CardPhase;

fn ms(n: u64) -> Duration {
    Duration::from_millis(n)
}

fn laid_out_board(t0: Instant, m: &mut HeuristicMeasurer) -> Board {
    let mut b = Board::new(BoardConfig::default(), SessionFlags::start(), t0).unwrap();
    b.layout(BoxSize::new(1000.0, 800.0), t0);
    b.tick(t0, m);
    b
}

#[test]
fn idle_board_stops_asking_for_frames() {
    let t0 = Instant::now();
    let mut m = HeuristicMeasurer::default();
    let mut b = laid_out_board(t0, &mut m);
    assert!(!b.tick(t0 + ms(1), &mut m));
}

#[test]
fn click_reveals_advice_and_fits_it() {
    let t0 = Instant::now();
    let mut m = HeuristicMeasurer::default();
    let mut b = laid_out_board(t0, &mut m);
    let id = BoxId(1);

    assert!(b.click(id, t0));
    assert!(!b.click(id, t0 + ms(10)), "a visited box is not interactive");
    assert!(b.session().is_visited(id));

    let card = b.card(id).unwrap();
    assert_eq!(card.phase(), CardPhase::Revealing);
    assert_eq!(card.text(), "Take one slow breath.");
    assert!(card.is_animating());

    // Resizes during the reveal are held back.
    b.layout(BoxSize::new(1010.0, 800.0), t0 + ms(100));
    assert!(b.tick(t0 + ms(300), &mut m));
    assert_eq!(b.card(id).unwrap().phase(), CardPhase::Revealing);

    b.tick(t0 + ms(550), &mut m);
    let card = b.card(id).unwrap();
    assert_eq!(card.phase(), CardPhase::Advice);
    assert!(!card.is_animating());
    let fit = card.last_fit().unwrap();
    assert_eq!(fit.outcome, FitOutcome::Fitted);
    assert_eq!(card.font_size(), fit.applied_size);

    // Post-settle refit changes nothing for an unchanged box.
    let settled_size = card.font_size();
    b.tick(t0 + ms(700), &mut m);
    assert_eq!(b.card(id).unwrap().font_size(), settled_size);
}

#[test]
fn resize_glides_to_new_size_and_latest_request_wins() {
    let t0 = Instant::now();
    let mut m = HeuristicMeasurer::default();
    let mut b = laid_out_board(t0, &mut m);
    let id = BoxId(1);
    b.click(id, t0);
    b.tick(t0 + ms(600), &mut m);
    b.tick(t0 + ms(700), &mut m);
    let before = b.card(id).unwrap().font_size();

    let t1 = t0 + ms(1000);
    b.layout(BoxSize::new(1400.0, 1000.0), t1);
    b.tick(t1 + ms(10), &mut m);
    assert!(!b.card(id).unwrap().is_animating(), "resize is debounced");

    b.tick(t1 + ms(100), &mut m);
    assert!(b.card(id).unwrap().is_animating(), "tween started");

    b.tick(t1 + ms(300), &mut m);
    let mid = b.card(id).unwrap().font_size();
    assert!(mid > before, "text grows during the tween");

    // A second resize supersedes the running tween.
    b.layout(BoxSize::new(1300.0, 950.0), t1 + ms(300));
    b.tick(t1 + ms(400), &mut m);
    assert!(b.card(id).unwrap().is_animating());

    b.tick(t1 + ms(1000), &mut m);
    let card = b.card(id).unwrap();
    assert!(!card.is_animating());
    let fit = card.last_fit().unwrap();
    assert_eq!(fit.outcome, FitOutcome::Fitted);
    assert_eq!(card.font_size(), fit.applied_size);
    assert!(card.font_size() >= before);
}

#[test]
fn collapsing_viewport_degrades_to_floor() {
    let t0 = Instant::now();
    let mut m = HeuristicMeasurer::default();
    let mut b = laid_out_board(t0, &mut m);
    b.click(BoxId(2), t0);
    b.tick(t0 + ms(600), &mut m);
    b.tick(t0 + ms(700), &mut m);

    let t1 = t0 + ms(1000);
    b.layout(BoxSize::ZERO, t1);
    b.tick(t1 + ms(100), &mut m);
    b.tick(t1 + ms(1000), &mut m);

    for card in b.cards() {
        assert_eq!(card.font_size(), 18.0, "{}", card.id());
        assert!(!card.is_animating());
    }
}

#[test]
fn boxes_visited_earlier_start_as_advice() {
    let t0 = Instant::now();
    let mut session = SessionFlags::start();
    session.mark_visited(BoxId(3));
    let mut b = Board::new(BoardConfig::default(), session, t0).unwrap();
    b.layout(BoxSize::new(1000.0, 800.0), t0);

    let card = b.card(BoxId(3)).unwrap();
    assert_eq!(card.phase(), CardPhase::Advice);
    assert_eq!(card.text(), "Choose rest tonight.");
    assert!(!b.click(BoxId(3), t0));

    let other = b.card(BoxId(2)).unwrap();
    assert_eq!(other.phase(), CardPhase::Covered);
    assert_eq!(other.text(), "2");
}

#[test]
fn unknown_box_click_is_ignored() {
    let t0 = Instant::now();
    let mut m = HeuristicMeasurer::default();
    let mut b = laid_out_board(t0, &mut m);
    assert!(!b.click(BoxId(99), t0));
    assert!(!b.session().is_visited(BoxId(99)));
}

#[test]
fn resize_queued_before_click_waits_for_reveal() {
    let t0 = Instant::now();
    let mut m = HeuristicMeasurer::default();
    let mut b = laid_out_board(t0, &mut m);
    let id = BoxId(1);
    let before = b.card(id).unwrap().font_size();
    let fit_before = *b.card(id).unwrap().last_fit().unwrap();

    let t1 = t0 + ms(1000);
    b.layout(BoxSize::new(1100.0, 800.0), t1);
    assert!(b.click(id, t1 + ms(10)));

    // The debounced resize would be due here; the reveal holds it back.
    b.tick(t1 + ms(100), &mut m);
    let card = b.card(id).unwrap();
    assert_eq!(card.phase(), CardPhase::Revealing);
    assert_eq!(card.font_size(), before);
    assert_eq!(card.last_fit(), Some(&fit_before));

    b.tick(t1 + ms(560), &mut m);
    let card = b.card(id).unwrap();
    assert_eq!(card.phase(), CardPhase::Advice);
    assert_eq!(card.font_size(), card.last_fit().unwrap().applied_size);
}
