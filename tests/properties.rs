//! Property tests over random pixel data.

use proptest::prelude::*;
use texgz::codec;
use texgz::texture::{Encoding, Texture};

fn texture(enc: Encoding) -> impl Strategy<Value = Texture> {
    (1u32..12, 1u32..12, 0u32..4, 0u32..4).prop_flat_map(move |(w, h, pw, ph)| {
        let (stride, vstride) = (w + pw, h + ph);
        let len = enc.bytes_per_pixel() * (stride * vstride) as usize;
        prop::collection::vec(any::<u8>(), len).prop_map(move |pixels| {
            Texture::from_pixels(w, h, stride, vstride, enc, pixels).unwrap()
        })
    })
}

fn any_texture() -> impl Strategy<Value = Texture> {
    prop::sample::select(Encoding::ALL.to_vec()).prop_flat_map(texture)
}

proptest! {
    #[test]
    fn stream_round_trip(tex in any_texture()) {
        let mut buf = Vec::new();
        codec::export_stream(&tex, &mut buf).unwrap();
        prop_assert_eq!(codec::import_stream(buf.as_slice()).unwrap(), tex);
    }

    #[test]
    fn block_round_trip(tex in any_texture()) {
        let block = codec::compress_block(&tex).unwrap();
        prop_assert_eq!(codec::decompress_block(&block).unwrap(), tex);
    }

    #[test]
    fn rgb_survives_the_hub(tex in texture(Encoding::Rgb888)) {
        let back = tex
            .convert_copy(Encoding::Rgba8888)
            .unwrap()
            .convert_copy(Encoding::Rgb888)
            .unwrap();
        prop_assert_eq!(back, tex);
    }

    #[test]
    fn bgra_survives_the_hub(tex in texture(Encoding::Bgra8888)) {
        let back = tex
            .convert_copy(Encoding::Rgba8888)
            .unwrap()
            .convert_copy(Encoding::Bgra8888)
            .unwrap();
        prop_assert_eq!(back, tex);
    }

    #[test]
    fn packed_values_survive_the_hub(
        tex in prop::sample::select(vec![Encoding::Rgba4444, Encoding::Rgb565, Encoding::Rgba5551])
            .prop_flat_map(texture)
    ) {
        // Expansion rounds, contraction truncates: every packed value comes back.
        let back = tex
            .convert_copy(Encoding::Rgba8888)
            .unwrap()
            .convert_copy(tex.encoding())
            .unwrap();
        prop_assert_eq!(back, tex);
    }
}
