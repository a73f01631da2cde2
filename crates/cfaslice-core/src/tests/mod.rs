/*! Test coverage for the IR model and both engines.
 *
 * The fixtures are small hand-built programs whose call targets and slices can be worked out on
 * paper, so every assertion below states an exact set rather than a size bound.
 */

#![allow(unused_imports)]
#![allow(unused_variables)]

mod builder_tests;
mod points_to_tests;
