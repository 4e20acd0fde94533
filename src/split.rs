//! Wide-to-long reshaping of paired home/away columns.
//!
//! A game row carries both teams side by side (`pts_home`, `pts_away`, ...).
//! [`SideSplitter`] turns each such row into one row per side: the common
//! columns, then that side's family with the marker removed from each name,
//! then a tag column holding the side label.
//!
//! Output order is fixed: the block for the first declared side (home) comes
//! first, followed by the block for the second side (away), each in input
//! row order.
//!
//! Family membership is decided either by substring discovery (any column
//! whose name contains the marker anywhere) or by an explicit column list.
//! Every occurrence of the marker is removed from the output name. Columns
//! claimed by no family and not common are dropped and reported back.

use crate::error::{EtlError, Result};
use crate::table::{Table, Value};

#[derive(Debug, Clone)]
enum Family {
    Discover,
    Columns(Vec<String>),
}

#[derive(Debug, Clone)]
struct Side {
    label: String,
    marker: String,
    family: Family,
}

/// Reshapes a table with paired side columns into long format.
#[derive(Debug, Clone)]
pub struct SideSplitter {
    tag_column: String,
    common: Vec<String>,
    sides: Vec<Side>,
}

/// Result of a split.
#[derive(Debug, Clone, PartialEq)]
pub struct SplitOutput {
    pub table: Table,
    /// Input columns that were dropped because no family claimed them.
    pub unclaimed: Vec<String>,
}

impl SideSplitter {
    /// A splitter that keeps `common` on every output row and tags sides in `tag_column`.
    pub fn new<S: AsRef<str>>(tag_column: impl Into<String>, common: &[S]) -> Self {
        Self {
            tag_column: tag_column.into(),
            common: common.iter().map(|c| c.as_ref().to_string()).collect(),
            sides: Vec::new(),
        }
    }

    /// Add a side whose family is every column containing `marker`.
    #[must_use]
    pub fn side(mut self, label: impl Into<String>, marker: impl Into<String>) -> Self {
        self.sides.push(Side {
            label: label.into(),
            marker: marker.into(),
            family: Family::Discover,
        });
        self
    }

    /// Add a side whose family is exactly `columns`, in that order.
    #[must_use]
    pub fn side_with_columns<S: AsRef<str>>(
        mut self,
        label: impl Into<String>,
        marker: impl Into<String>,
        columns: &[S],
    ) -> Self {
        self.sides.push(Side {
            label: label.into(),
            marker: marker.into(),
            family: Family::Columns(columns.iter().map(|c| c.as_ref().to_string()).collect()),
        });
        self
    }

    /// The conventional `_home` / `_away` pair with discovered families.
    pub fn home_away<S: AsRef<str>>(tag_column: impl Into<String>, common: &[S]) -> Self {
        Self::new(tag_column, common)
            .side("home", "_home")
            .side("away", "_away")
    }

    /// Reshape `table`.
    ///
    /// # Errors
    /// [`EtlError::SchemaMismatch`] if a common or enumerated column is absent;
    /// [`EtlError::ColumnConflict`] if the tag column collides with an output column.
    pub fn split(&self, table: &Table) -> Result<SplitOutput> {
        let common_idx = self
            .common
            .iter()
            .map(|c| table.require(c))
            .collect::<Result<Vec<_>>>()?;

        // (input index, stripped name) per side
        let mut families: Vec<Vec<(usize, String)>> = Vec::with_capacity(self.sides.len());
        for side in &self.sides {
            let members = match &side.family {
                Family::Discover => table
                    .columns()
                    .iter()
                    .enumerate()
                    .filter(|(_, c)| c.contains(&side.marker))
                    .map(|(i, c)| (i, c.replace(&side.marker, "")))
                    .collect(),
                Family::Columns(cols) => cols
                    .iter()
                    .map(|c| Ok((table.require(c)?, c.replace(&side.marker, ""))))
                    .collect::<Result<Vec<_>>>()?,
            };
            families.push(members);
        }

        // Output header: common, then the union of stripped family names in
        // first-seen order, then the tag. A side lacking a name gets nulls.
        let mut header: Vec<String> = self.common.clone();
        for members in &families {
            for (_, name) in members {
                if !header[self.common.len()..].contains(name) {
                    if self.common.contains(name) {
                        return Err(EtlError::ColumnConflict {
                            table: table.name().to_string(),
                            column: name.clone(),
                        });
                    }
                    header.push(name.clone());
                }
            }
        }
        if header.contains(&self.tag_column) {
            return Err(EtlError::ColumnConflict {
                table: table.name().to_string(),
                column: self.tag_column.clone(),
            });
        }
        header.push(self.tag_column.clone());

        let family_width = header.len() - self.common.len() - 1;
        let mut out = Table::new(table.name(), header.clone());
        for (side, members) in self.sides.iter().zip(&families) {
            // output slot for each member
            let slots: Vec<(usize, usize)> = members
                .iter()
                .map(|(i, name)| {
                    let pos = header[self.common.len()..]
                        .iter()
                        .position(|h| h == name)
                        .unwrap_or_default();
                    (*i, self.common.len() + pos)
                })
                .collect();
            let label = Value::Str(side.label.clone());
            for row in table.rows() {
                let mut new_row = Vec::with_capacity(header.len());
                new_row.extend(common_idx.iter().map(|&i| row[i].clone()));
                new_row.resize(self.common.len() + family_width, Value::Null);
                for &(src, dst) in &slots {
                    new_row[dst] = row[src].clone();
                }
                new_row.push(label.clone());
                out.push_row(new_row);
            }
        }

        let unclaimed = table
            .columns()
            .iter()
            .enumerate()
            .filter(|(i, _)| {
                !common_idx.contains(i) && !families.iter().flatten().any(|(j, _)| j == i)
            })
            .map(|(_, c)| c.clone())
            .collect();

        Ok(SplitOutput {
            table: out,
            unclaimed,
        })
    }
}
