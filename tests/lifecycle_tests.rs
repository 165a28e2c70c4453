//! End, destroy, and the pause interactions that must not spin.


use bufstream_exec::{
    BufferedStream, Encoding, Error, Input, Payload, StreamConfig, StreamEvent,
};
use stream_recorder::{manual, Recorder};

#[test]
fn test_end_on_empty_stream_terminates_promptly() {
    let sched = manual();
    let stream = BufferedStream::new(sched.clone());
    let rec = Recorder::attach(&stream);

    stream.end().unwrap();
    assert!(stream.is_ended());
    assert!(stream.is_readable(), "teardown happens on a later turn");

    let turns = sched.run_until_idle(10);
    assert!(turns <= 2, "took {turns} turns");
    assert_eq!(rec.events(), vec![StreamEvent::End]);
    assert!(!stream.is_readable());
    assert!(!stream.is_writable());
}

#[test]
fn test_end_waits_for_queued_data() {
    let sched = manual();
    let cfg = StreamConfig {
        max_chunks_per_turn: Some(1),
        ..StreamConfig::default()
    };
    let stream = BufferedStream::with_config(sched.clone(), cfg);
    let rec = Recorder::attach(&stream);

    stream.write("a").unwrap();
    stream.write("b").unwrap();
    stream.end_with("c").unwrap();
    sched.run_until_idle(20);

    assert_eq!(rec.names(), vec!["data", "data", "data", "end"]);
    assert_eq!(rec.data(), b"abc");
}

#[test]
fn test_second_end_is_illegal_state() {
    let sched = manual();
    let stream = BufferedStream::new(sched.clone());
    let rec = Recorder::attach(&stream);

    stream.end().unwrap();
    let err = stream.end().unwrap_err();
    assert_eq!(err, Error::AlreadyEnded);
    assert!(err.is_illegal_state());

    sched.run_until_idle(10);
    assert_eq!(rec.count("end"), 1);
    // Still rejected after teardown.
    assert_eq!(stream.end().unwrap_err(), Error::AlreadyEnded);
}

#[test]
fn test_end_with_empty_payload_emits_end_once() {
    let sched = manual();
    let stream = BufferedStream::new(sched.clone());
    let rec = Recorder::attach(&stream);

    stream.end_with("").unwrap();
    sched.run_until_idle(10);
    // The empty final write is still a chunk, delivered ahead of `End`.
    assert_eq!(rec.names(), vec!["data", "end"]);
    assert!(matches!(&rec.events()[0], StreamEvent::Data(p) if p.is_empty()));
}

#[test]
fn test_write_after_end_or_destroy_is_rejected() {
    let sched = manual();
    let ended = BufferedStream::new(sched.clone());
    ended.end().unwrap();
    assert_eq!(ended.write("late").unwrap_err(), Error::AlreadyEnded);

    let destroyed = BufferedStream::new(sched.clone());
    destroyed.destroy();
    assert_eq!(destroyed.write("late").unwrap_err(), Error::NotWritable);
    assert_eq!(destroyed.end().unwrap_err(), Error::NotWritable);
    assert!(destroyed.write("late").unwrap_err().is_illegal_state());
}

#[test]
fn test_destroy_drops_data_and_is_silent() {
    let sched = manual();
    let stream = BufferedStream::new(sched.clone());
    let rec = Recorder::attach(&stream);

    stream.write("doomed").unwrap();
    stream.destroy();
    assert!(stream.is_empty());
    assert_eq!(stream.size(), 0);

    stream.pause();
    stream.resume();
    sched.run_until_idle(10);
    assert!(rec.events().is_empty());
    assert!(sched.is_idle());
}

#[test]
fn test_destroy_does_not_cancel_a_pending_end() {
    let sched = manual();
    let stream = BufferedStream::new(sched.clone());
    let rec = Recorder::attach(&stream);

    stream.write("x").unwrap();
    stream.end().unwrap();
    stream.destroy();
    sched.run_until_idle(10);
    assert_eq!(rec.events(), vec![StreamEvent::End]);
}

#[test]
fn test_destroy_while_paused_and_ended_stays_silent_on_resume() {
    let sched = manual();
    let stream = BufferedStream::new(sched.clone());

    stream.pause();
    stream.end().unwrap();
    stream.destroy();
    let rec = Recorder::attach(&stream);

    stream.resume();
    sched.run_until_idle(10);
    assert!(rec.events().is_empty());
    assert!(sched.is_idle());
    assert!(!stream.is_readable());
}

#[test]
fn test_pause_stalls_end_until_resume() {
    let sched = manual();
    let stream = BufferedStream::new(sched.clone());
    let rec = Recorder::attach(&stream);

    stream.pause();
    stream.write("held").unwrap();
    stream.end().unwrap();
    sched.run_until_idle(10);
    assert_eq!(rec.names(), vec!["pause"]);
    assert!(stream.is_readable());

    stream.resume();
    sched.run_until_idle(10);
    assert_eq!(rec.names(), vec!["pause", "resume", "data", "end"]);
    assert_eq!(rec.data(), b"held");
}

#[test]
fn test_paused_streams_do_no_scheduled_work() {
    let sched = manual();
    let mut streams = Vec::new();

    // empty + paused
    let s = BufferedStream::new(sched.clone());
    s.pause();
    streams.push(s);

    // some data + paused before the drain could start
    let s = BufferedStream::new(sched.clone());
    s.pause();
    s.write("data").unwrap();
    streams.push(s);

    // some data + paused after the drain was scheduled
    let s = BufferedStream::new(sched.clone());
    s.write("data").unwrap();
    s.pause();
    streams.push(s);

    // ended + paused, no payload
    let s = BufferedStream::new(sched.clone());
    s.end().unwrap();
    s.pause();
    streams.push(s);

    // ended + paused, with payload
    let s = BufferedStream::new(sched.clone());
    s.end_with("payload").unwrap();
    s.pause();
    streams.push(s);

    // seeded at construction, then paused
    let s = BufferedStream::from_payload(sched.clone(), StreamConfig::default(), "seeded")
        .unwrap();
    s.pause();
    streams.push(s);

    let recs: Vec<Recorder> = streams.iter().map(Recorder::attach).collect();

    // Already-scheduled steps notice the pause and stop.
    assert!(sched.run_until_idle(10) <= 1);
    assert!(sched.is_idle());
    let executed = sched.executed();

    for _ in 0..100 {
        sched.run_turn();
    }
    assert_eq!(sched.executed(), executed, "no step may run while paused");
    for rec in &recs {
        assert!(rec.events().is_empty());
    }

    for s in &streams {
        s.resume();
    }
    sched.run_until_idle(20);
    assert!(sched.is_idle());
    let ends: Vec<usize> = recs.iter().map(|r| r.count("end")).collect();
    assert_eq!(ends, vec![0, 0, 0, 1, 1, 1]);
    assert_eq!(recs[1].data(), b"data");
    assert_eq!(recs[2].data(), b"data");
    assert_eq!(recs[5].data(), b"seeded");
}

#[test]
fn test_from_payload_decodes_with_the_given_encoding() {
    let sched = manual();
    let stream = BufferedStream::from_payload(
        sched.clone(),
        StreamConfig::default(),
        Input::encoded("68656c6c6f", Encoding::Hex),
    )
    .unwrap();
    assert!(stream.is_ended());
    let rec = Recorder::attach(&stream);
    sched.run_until_idle(10);
    assert_eq!(rec.data(), b"hello");
    assert_eq!(rec.count("end"), 1);
}

#[test]
fn test_from_payload_rejects_malformed_text() {
    let sched = manual();
    let err = BufferedStream::from_payload(
        sched.clone(),
        StreamConfig::default(),
        Input::encoded("xyz", Encoding::Hex),
    )
    .unwrap_err();
    assert!(matches!(err, Error::Encoding { .. }));
    assert!(sched.is_idle());
}

#[test]
fn test_text_mode_emits_decoded_strings() {
    let sched = manual();
    let stream = BufferedStream::new(sched.clone());
    let rec = Recorder::attach(&stream);

    stream.write(vec![0x68, 0x69]).unwrap();
    sched.run_until_idle(10);
    stream.set_encoding(Some(Encoding::Hex));
    stream.write(vec![0x68, 0x69]).unwrap();
    sched.run_until_idle(10);

    let events = rec.events();
    assert!(matches!(&events[0], StreamEvent::Data(Payload::Bytes(c)) if &c[..] == b"hi"));
    assert_eq!(
        events[1],
        StreamEvent::Data(Payload::Text {
            text: "6869".into(),
            encoding: Encoding::Hex,
        })
    );
}

#[test]
fn test_config_encoding_sets_text_mode() {
    let sched = manual();
    let cfg: StreamConfig = serde_json::from_str(r#"{"encoding": "utf8"}"#).unwrap();
    let stream = BufferedStream::with_config(sched.clone(), cfg);
    assert_eq!(stream.encoding(), Some(Encoding::Utf8));
    let rec = Recorder::attach(&stream);

    stream.write("h\u{e9}").unwrap();
    sched.run_until_idle(10);
    assert_eq!(
        rec.events(),
        vec![StreamEvent::Data(Payload::Text {
            text: "h\u{e9}".into(),
            encoding: Encoding::Utf8,
        })]
    );
}

#[test]
fn test_end_from_an_end_listener_of_another_stream_is_ordered() {
    let sched = manual();
    let first = BufferedStream::new(sched.clone());
    let second = BufferedStream::new(sched.clone());
    let rec = Recorder::attach(&second);

    let follower = second.clone();
    first.subscribe(move |e| {
        if let StreamEvent::End = e {
            follower.end_with("after").unwrap();
        }
    });

    first.end().unwrap();
    sched.run_until_idle(10);
    assert_eq!(rec.names(), vec!["data", "end"]);
}
