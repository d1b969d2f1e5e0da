use auroralink_core::bands::frame_to_band_indices;
use auroralink_core::palette::PALETTE;
use auroralink_core::{
    AuroraLinkError, Detection, Detector, Frame, MultiFrameDecoder, PacketEncoder, NUM_BANDS,
};

const WIDTH: usize = 800;
const HEIGHT: usize = 160;

/// Stand-in for the WebGL renderer: paint a frame's band symbols as solid
/// palette colors into a black RGBA raster.
fn render_frame(frame: &Frame) -> Vec<u8> {
    let indices = frame_to_band_indices(frame);
    let mut rgba = vec![0u8; WIDTH * HEIGHT * 4];
    let (left, right, top, bottom) = (80usize, 719usize, 40usize, 119usize);
    let span = right - left + 1;
    for (band, &index) in indices.iter().enumerate() {
        let x0 = left + band * span / NUM_BANDS;
        let x1 = left + (band + 1) * span / NUM_BANDS;
        let [r, g, b] = PALETTE[index as usize];
        for y in top..=bottom {
            for x in x0..x1 {
                let i = (y * WIDTH + x) * 4;
                rgba[i] = r;
                rgba[i + 1] = g;
                rgba[i + 2] = b;
                rgba[i + 3] = 255;
            }
        }
    }
    rgba
}

#[test]
fn test_lossless_round_trip() {
    let messages = [
        "A",
        "Hello Aurora!",
        "Northern lights over the fjord at 2am",
        "non-ascii: åländska ögon ser grönt 北極光",
    ];
    for message in messages {
        let packet = PacketEncoder::new().encode(message).expect("encode");
        let mut decoder = MultiFrameDecoder::new();
        for frame in packet.frames {
            assert!(decoder.add_frame(frame));
        }
        assert_eq!(decoder.decode().expect("decode"), message, "{message}");
    }
}

#[test]
fn test_round_trip_through_detector() {
    let message = "Hello Aurora!";
    let packet = PacketEncoder::new().encode(message).expect("encode");

    let detector = Detector::new();
    let mut decoder = MultiFrameDecoder::new();
    for frame in &packet.frames {
        let rgba = render_frame(frame);
        match detector.detect(&rgba, WIDTH, HEIGHT) {
            Detection::Frame {
                frame: detected,
                confidence,
            } => {
                assert_eq!(&detected, frame);
                assert!(confidence > 0.9);
                assert!(decoder.add_frame(detected));
            }
            other => panic!("frame {} not detected: {other:?}", frame.frame_index),
        }
    }
    assert_eq!(decoder.decode().expect("decode"), message);
}

#[test]
fn test_recovers_from_dropped_frames() {
    let message = "Hello Aurora!";
    let packet = PacketEncoder::new()
        .encode_with_sequence_id(message, 0x0A0A)
        .expect("encode");
    assert_eq!(packet.total_frames(), 6);

    // drop data frame 1 and parity frame 3
    let mut decoder = MultiFrameDecoder::new();
    for frame in packet.frames {
        if frame.frame_index != 1 && frame.frame_index != 3 {
            decoder.add_frame(frame);
        }
    }
    assert!(decoder.can_decode());
    assert_eq!(decoder.decode().expect("decode"), message);
}

#[test]
fn test_recovers_from_any_parity_many_drops() {
    let message = "a longer message that spans a handful of data frames for the drop sweep";
    let packet = PacketEncoder::new()
        .encode_with_sequence_id(message, 0x7777)
        .expect("encode");
    let parity = packet.parity_frames;
    let total = packet.total_frames();

    // drop every window of `parity` consecutive frames
    for start in 0..=(total - parity) {
        let mut decoder = MultiFrameDecoder::new();
        for frame in &packet.frames {
            let index = frame.frame_index as usize;
            if index < start || index >= start + parity {
                decoder.add_frame(frame.clone());
            }
        }
        assert_eq!(
            decoder.decode().expect("decode"),
            message,
            "dropped frames {start}..{}",
            start + parity
        );
    }
}

#[test]
fn test_too_many_drops_fail_without_wrong_answer() {
    let message = "Hello Aurora!";
    let packet = PacketEncoder::new()
        .encode_with_sequence_id(message, 0x0B0B)
        .expect("encode");
    let parity = packet.parity_frames;

    let mut decoder = MultiFrameDecoder::new();
    for frame in packet.frames.iter().skip(parity + 1) {
        decoder.add_frame(frame.clone());
    }
    match decoder.decode() {
        Err(AuroraLinkError::InsufficientFrames { missing, .. }) => {
            assert_eq!(missing.len(), parity + 1);
        }
        Ok(result) => panic!("decode produced {result:?} from insufficient frames"),
        Err(other) => panic!("unexpected error {other:?}"),
    }
}

#[test]
fn test_corrupted_frame_is_screened_out() {
    let message = "Hello Aurora!";
    let packet = PacketEncoder::new()
        .encode_with_sequence_id(message, 0x0C0C)
        .expect("encode");

    let detector = Detector::new();
    let mut decoder = MultiFrameDecoder::new();
    for (i, frame) in packet.frames.iter().enumerate() {
        if i == 2 {
            // corrupt one data byte after checksum stamping
            let mut bad = frame.clone();
            bad.data_chunk[4] ^= 0x3C;
            let rgba = render_frame(&bad);
            match detector.detect(&rgba, WIDTH, HEIGHT) {
                Detection::ChecksumMismatch { .. } => {}
                other => panic!("corruption not flagged: {other:?}"),
            }
            // the detector never forwards it, so neither do we
            continue;
        }
        decoder.add_frame(frame.clone());
    }

    // five healthy frames out of six still decode
    assert_eq!(decoder.decode().expect("decode"), message);
}

#[test]
fn test_new_sequence_replaces_old() {
    let old = PacketEncoder::new()
        .encode_with_sequence_id("old news", 0x1234)
        .expect("encode");
    let new = PacketEncoder::new()
        .encode_with_sequence_id("fresh message over ten", 0x9ABC)
        .expect("encode");

    let mut decoder = MultiFrameDecoder::new();
    for frame in &old.frames {
        decoder.add_frame(frame.clone());
    }
    assert!(decoder.can_decode());

    decoder.add_frame(new.frames[0].clone());
    let progress = decoder.progress();
    assert_eq!(progress.collected, 1);
    assert_eq!(progress.total_frames, new.total_frames());
    assert!(!progress.can_decode);

    for frame in new.frames.iter().skip(1) {
        decoder.add_frame(frame.clone());
    }
    assert_eq!(decoder.decode().expect("decode"), "fresh message over ten");
}

#[test]
fn test_out_of_order_delivery() {
    let message = "frames arrive whenever the camera catches them";
    let packet = PacketEncoder::new()
        .encode_with_sequence_id(message, 0x0D0D)
        .expect("encode");

    let mut decoder = MultiFrameDecoder::new();
    for frame in packet.frames.iter().rev() {
        decoder.add_frame(frame.clone());
    }
    assert_eq!(decoder.decode().expect("decode"), message);
}
