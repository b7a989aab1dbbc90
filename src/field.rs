use crate::{
    error::{MetaballError, Result},
    types::{Point, Value, Vector},
    utils::is_inside,
};

/// Multiple of the ball radius added around the sources when sizing the sampling volume.
pub const DEFAULT_BOUNDS_MARGIN: Value = 1.25;

/// Axis-aligned box enclosing every field source plus a margin.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub min: Point,
    pub max: Point,
}

impl BoundingBox {
    /// Returns the box around `points` grown by `margin` on every side,
    /// or `None` when there are no points.
    pub fn enclosing<'a, I>(points: I, margin: Value) -> Option<Self>
    where
        I: IntoIterator<Item = &'a Point>,
    {
        let mut points = points.into_iter();
        let first = *points.next()?;
        let (min, max) = points.fold((first, first), |(min, max), p| (min.inf(p), max.sup(p)));
        let margin = Vector::repeat(margin);
        Some(Self {
            min: min - margin,
            max: max + margin,
        })
    }

    /// Size of the box along each axis.
    pub fn extents(&self) -> Vector {
        self.max - self.min
    }

    /// Size of the box along its longest axis.
    pub fn largest_extent(&self) -> Value {
        self.extents().max()
    }

    pub fn contains(&self, p: &Point) -> bool {
        (0..3).all(|axis| self.min[axis] <= p[axis] && p[axis] <= self.max[axis])
    }
}

/// Metaball scalar field: `f(p) = radius² · Σ 1/|p - source|² - 1`.
///
/// `f >= 0` is inside the surface, `f < 0` outside. The field holds a snapshot of
/// the source positions taken by [`refresh`](MetaballField::refresh); evaluation is
/// pure between refreshes.
///
/// Exactly at a source position the contribution is `1/0 = +inf`. This is not guarded:
/// sample corners can land on a source (a single ball at the origin with an even
/// number of steps does), the corner then reads as inside and the cycle carries on.
#[derive(Debug, Clone)]
pub struct MetaballField {
    sources: Vec<Point>,
    radius: Value,
    margin: Value,
    bounds: Option<BoundingBox>,
}

impl MetaballField {
    /// Creates an empty field with the given shared ball radius.
    pub fn new(radius: Value) -> Result<Self> {
        validate_radius(radius)?;
        Ok(Self {
            sources: Vec::new(),
            radius,
            margin: DEFAULT_BOUNDS_MARGIN,
            bounds: None,
        })
    }

    /// Sets the bounding-box margin, as a multiple of the radius.
    pub fn with_margin(mut self, margin: Value) -> Result<Self> {
        if !margin.is_finite() || margin < 0. {
            return Err(MetaballError::InvalidMargin(margin));
        }
        self.margin = margin;
        Ok(self)
    }

    pub fn radius(&self) -> Value {
        self.radius
    }

    /// Changes the shared radius. Takes effect at the next [`refresh`](MetaballField::refresh).
    pub fn set_radius(&mut self, radius: Value) -> Result<()> {
        validate_radius(radius)?;
        self.radius = radius;
        Ok(())
    }

    pub fn margin(&self) -> Value {
        self.margin
    }

    /// Source positions captured by the last refresh.
    pub fn sources(&self) -> &[Point] {
        &self.sources
    }

    /// Bounding box computed by the last refresh; `None` without sources.
    pub fn bounds(&self) -> Option<BoundingBox> {
        self.bounds
    }

    /// Re-reads the source positions and recomputes the bounding box.
    ///
    /// Must be called once per cycle before any [`evaluate`](MetaballField::evaluate).
    pub fn refresh<I>(&mut self, positions: I)
    where
        I: IntoIterator<Item = Point>,
    {
        self.sources.clear();
        self.sources.extend(positions);
        self.bounds = BoundingBox::enclosing(&self.sources, self.radius * self.margin);
    }

    /// Field value at `p`, summed over every source.
    ///
    /// The `-1` offset is applied once to the whole sum, not once per source.
    #[inline]
    pub fn evaluate(&self, p: &Point) -> Value {
        let sum: Value = self
            .sources
            .iter()
            .map(|source| 1. / (source - p).norm_squared())
            .sum();
        sum * self.radius * self.radius - 1.
    }

    /// Whether `p` counts as inside the surface (`f(p) >= 0`).
    #[inline]
    pub fn is_inside(&self, p: &Point) -> bool {
        is_inside(self.evaluate(p))
    }
}

fn validate_radius(radius: Value) -> Result<()> {
    if radius.is_finite() && radius > 0. {
        Ok(())
    } else {
        Err(MetaballError::InvalidRadius(radius))
    }
}
