fn rule(cell_width: usize, text_width: usize) -> String {
    " ".repeat(cell_width - text_width) + "─".repeat(text_width).as_str()
}

fn print_row(cells: &[String], widths: &[usize]) {
    for (cell, width) in cells.iter().zip(widths.iter()) {
        print!("  {}{}", " ".repeat(width - cell.len()), cell);
    }
    println!();
}

/// Print a right-aligned table with a ruled header.
///
/// Widths are measured in bytes, so cells should stick to ASCII.
pub fn print_table(header: &[&str], rows: &[Vec<String>]) {
    let header: Vec<String> =
        header.iter().map(|cell| (*cell).to_owned()).collect();

    let mut widths: Vec<usize> = header.iter().map(String::len).collect();
    for row in rows {
        debug_assert_eq!(row.len(), widths.len());
        for (width, cell) in widths.iter_mut().zip(row.iter()) {
            *width = (*width).max(cell.len());
        }
    }

    print_row(&header, &widths);
    for (cell, width) in header.iter().zip(widths.iter()) {
        print!("  {}", rule(*width, cell.len()));
    }
    println!();
    rows.iter().for_each(|row| print_row(row, &widths));
}
