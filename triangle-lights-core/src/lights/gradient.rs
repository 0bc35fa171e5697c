use enterpolation::{
    Curve, Equidistant, Merge,
    bspline::{BSpline, BorderBuffer},
};
use palette::{Hsluv, Mix, white_point};
use smart_leds::{RGB8, colors::BLACK};

use super::convert_color;

/// enterpolation blends knots with `Merge`. palette colors only know `Mix`, so wrap them
#[derive(Debug, Copy, Clone, Default)]
struct Knot<C: Mix>(C);

impl<C: Mix> From<C> for Knot<C> {
    fn from(color: C) -> Self {
        Self(color)
    }
}

impl<C: Mix<Scalar = f32>> Merge<f32> for Knot<C> {
    fn merge(self, other: Self, factor: f32) -> Self {
        Knot(self.0.mix(other.0, factor))
    }
}

/// `N` evenly spaced samples along a color spline
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Gradient<const N: usize> {
    pub colors: [RGB8; N],
}

impl<const N: usize> Gradient<N> {
    pub fn new(iter: impl Iterator<Item = RGB8>) -> Self {
        let mut colors = [BLACK; N];

        for (x, color) in colors.iter_mut().zip(iter) {
            *x = color
        }

        Self { colors }
    }

    pub fn new_mermaid() -> Self {
        Self::new(mermaid_spline().take(N).map(|x| convert_color(x.0)))
    }

    pub fn new_sunset() -> Self {
        Self::new(sunset_spline().take(N).map(|x| convert_color(x.0)))
    }

    pub fn new_jade_sea() -> Self {
        Self::new(jade_sea_spline().take(N).map(|x| convert_color(x.0)))
    }
}

/// TODO: return traits to make this easier to change
type HsluvSpline<const E: usize> = BSpline<
    BorderBuffer<Equidistant<f32>>,
    [Knot<Hsluv<white_point::E>>; E],
    enterpolation::ConstSpace<Knot<Hsluv<white_point::E>>, 4>,
>;

fn hsluv(h: f32, s: f32, l: f32) -> Knot<Hsluv<white_point::E>> {
    Knot(Hsluv::new(h, s, l))
}

/// every spline here is a clamped, degree 3 bspline through hardcoded colors
fn hsluv_spline<const E: usize>(
    elements: [Knot<Hsluv<white_point::E>>; E],
) -> HsluvSpline<E> {
    BSpline::builder()
        .clamped()
        .elements(elements)
        .equidistant::<f32>()
        .degree(3)
        .normalized()
        .constant::<4>()
        .build()
        .expect("As the curve is hardcoded, this should always work")
}

/// --cobalt-blue: #004AADff;
/// --medium-slate-blue: #865BDCff;
/// --blue-crayola: #5D79F7ff;
/// --jade: #27B26Eff;
///
/// <https://www.hsluv.org/>
fn mermaid_spline() -> HsluvSpline<4> {
    hsluv_spline([
        // #004AAD
        hsluv(258.3, 100.0, 33.8),
        // #865BDC
        hsluv(275.1, 76.5, 49.2),
        // #5D79F7
        hsluv(261.5, 93.8, 54.8),
        // #27B26E
        hsluv(142.2, 93.3, 64.5),
    ])
}

/// navy, magenta, pink, red, sandy
fn sunset_spline() -> HsluvSpline<5> {
    hsluv_spline([
        // #1f005c
        hsluv(272.0, 100.0, 10.0),
        // #8c00a0
        hsluv(293.0, 100.0, 31.0),
        // #e30084
        hsluv(338.0, 100.0, 49.0),
        // #ff2830
        hsluv(10.0, 100.0, 56.0),
        // #ffb56b
        hsluv(43.0, 100.0, 80.0),
    ])
}

/// deep teal up to seafoam
fn jade_sea_spline() -> HsluvSpline<4> {
    hsluv_spline([
        hsluv(200.0, 100.0, 20.0),
        hsluv(180.0, 90.0, 45.0),
        hsluv(142.2, 93.3, 64.5),
        hsluv(120.0, 60.0, 85.0),
    ])
}
