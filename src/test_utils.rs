//! Test utilities for building gimmick sets, charts, and hold chains.
