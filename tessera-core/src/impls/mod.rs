mod map;
mod option;
mod pointer;
mod scalar;
mod sequence;
mod tuple;
