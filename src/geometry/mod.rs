//! Static collision geometry preparation: the convex hull builder.

pub mod convex_hull;
